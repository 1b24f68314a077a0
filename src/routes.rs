use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use statement_xlsx::{BatchReport, ExportFormat, FileOutcome};
use url::Url;
use worker::{Context, Date, Env, Request, Response, Result, RouteContext, Router};

use crate::convert_pipeline::{self, ConversionResult};
use crate::error::ApiError;
use crate::models::{DEFAULT_OUTPUT_PREFIX, REPORT_HEADER};
use crate::upload_page::UPLOAD_PAGE_HTML;

#[derive(Debug, Clone)]
pub struct AppState {
    pub output_prefix: String,
}

pub async fn handle(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    let output_prefix = env
        .var("OUTPUT_PREFIX")
        .map(|value| value.to_string())
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string());

    let state = AppState { output_prefix };

    Router::with_data(state)
        .get("/", upload_page_route)
        .post_async("/api/v1/convert", convert_route)
        .post_async("/api/v1/inspect", inspect_route)
        .run(req, env)
        .await
}

fn upload_page_route(_req: Request, _ctx: RouteContext<AppState>) -> Result<Response> {
    Response::from_html(UPLOAD_PAGE_HTML)
}

async fn convert_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match convert_response(&mut req, &ctx.data.output_prefix).await {
        Ok(response) => Ok(response),
        Err(error) => error.into_response(),
    }
}

async fn inspect_route(mut req: Request, _ctx: RouteContext<AppState>) -> Result<Response> {
    match inspect_response(&mut req).await {
        Ok(response) => Ok(response),
        Err(error) => error.into_response(),
    }
}

async fn convert_response(req: &mut Request, output_prefix: &str) -> Result<Response, ApiError> {
    let query = parse_query(&req.url()?);
    let format = parse_format_query(&query)?;

    let batch = process_uploads(req).await?;
    match convert_pipeline::finish_batch(&batch, format, output_prefix, &now_utc())? {
        ConversionResult::Ready {
            file_name,
            format,
            bytes,
            report,
        } => {
            worker::console_log!(
                "combined output ready: file={}, rows={}, columns={}",
                file_name,
                report.row_count,
                report.columns.len()
            );
            let mut response = Response::from_bytes(bytes)?;
            response
                .headers_mut()
                .set("Content-Type", format.content_type())?;
            response.headers_mut().set(
                "Content-Disposition",
                &format!("attachment; filename=\"{file_name}\""),
            )?;
            response.headers_mut().set(
                REPORT_HEADER,
                &convert_pipeline::encode_report_header(&report)?,
            )?;
            response
                .headers_mut()
                .set("Access-Control-Expose-Headers", REPORT_HEADER)?;
            response.headers_mut().set("Cache-Control", "no-store")?;
            Ok(response)
        }
        ConversionResult::NothingConverted(report) => {
            worker::console_error!(
                "no statement converted; {} file(s) skipped",
                report.skipped
            );
            Ok(json_response(&report)?.with_status(422))
        }
    }
}

async fn inspect_response(req: &mut Request) -> Result<Response, ApiError> {
    let batch = process_uploads(req).await?;
    let combined = batch.combined();
    let report = convert_pipeline::build_report(&batch, combined.as_ref(), None);
    Ok(json_response(&report)?)
}

async fn process_uploads(req: &mut Request) -> Result<BatchReport, ApiError> {
    let uploads = convert_pipeline::read_uploads(req).await?;
    let batch = convert_pipeline::convert_uploads(&uploads);
    log_outcomes(&batch);
    Ok(batch)
}

fn log_outcomes(batch: &BatchReport) {
    for outcome in &batch.outcomes {
        match outcome {
            FileOutcome::Converted {
                file_name, table, ..
            } => worker::console_log!(
                "converted {}: rows={}, columns={}",
                file_name,
                table.row_count(),
                table.column_count()
            ),
            FileOutcome::Skipped { file_name, error } => {
                worker::console_error!("skipped {}: {}", file_name, error);
            }
        }
    }
}

fn json_response<T>(payload: &T) -> Result<Response>
where
    T: Serialize,
{
    let mut response = Response::from_json(payload)?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn now_utc() -> DateTime<Utc> {
    i64::try_from(Date::now().as_millis())
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

pub fn parse_query(url: &Url) -> HashMap<String, String> {
    url.query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>()
}

pub fn parse_format_query(query: &HashMap<String, String>) -> Result<ExportFormat, ApiError> {
    let Some(raw) = query.get("format") else {
        return Ok(ExportFormat::default());
    };
    ExportFormat::from_str(raw).map_err(ApiError::BadRequest)
}

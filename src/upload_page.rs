/// Upload form served at `/`.
///
/// The script posts the chosen PDFs to the convert endpoint, lists the
/// per-file outcome from the report header and offers the workbook for
/// download.
pub const UPLOAD_PAGE_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>PDF to Excel Converter</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 3rem auto; }
  li.converted { color: #1a7f37; }
  li.skipped { color: #9a6700; }
</style>
</head>
<body>
<h1>PDF to Excel Converter</h1>
<form id="upload">
  <input type="file" name="files" accept="application/pdf,.pdf" multiple required>
  <button type="submit">Convert</button>
</form>
<ul id="outcomes"></ul>
<p id="download"></p>
<script>
const form = document.getElementById("upload");
const outcomes = document.getElementById("outcomes");
const download = document.getElementById("download");

function showReport(report) {
  outcomes.replaceChildren();
  for (const file of report.files) {
    const item = document.createElement("li");
    item.className = file.status;
    item.textContent = file.status === "converted"
      ? `Processed ${file.file_name} (${file.rows} rows)`
      : `Skipped ${file.file_name}: ${file.message}`;
    outcomes.appendChild(item);
  }
}

form.addEventListener("submit", async (event) => {
  event.preventDefault();
  download.replaceChildren();
  const response = await fetch("/api/v1/convert", { method: "POST", body: new FormData(form) });

  if (response.ok) {
    const header = response.headers.get("X-Conversion-Report");
    const report = JSON.parse(decodeURIComponent(header));
    showReport(report);
    const link = document.createElement("a");
    link.href = URL.createObjectURL(await response.blob());
    link.download = report.output_file;
    link.textContent = "Download Excel";
    download.appendChild(link);
    return;
  }

  const body = await response.json();
  if (body.files) {
    showReport(body);
  } else {
    download.textContent = body.message;
  }
});
</script>
</body>
</html>
"#;

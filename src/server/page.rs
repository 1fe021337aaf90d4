//! The single dashboard page. Charts are drawn by Plotly.js from the figures the API returns.

pub const INDEX: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Transaction Dashboard</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>
<style>
  body { font-family: Arial, sans-serif; margin: 20px; }
  .controls { display: flex; gap: 12px; align-items: center; margin-bottom: 12px; }
  .chart { width: 100%; height: 420px; }
  table { border-collapse: collapse; width: 100%; margin-top: 12px; }
  th, td { border: 1px solid lightgrey; padding: 4px 8px; text-align: left; }
  th { background: #f5f5f5; }
  #source { color: grey; font-size: 0.9em; }
</style>
</head>
<body>
<h1>Transaction Dashboard</h1>
<div class="controls">
  <button id="reload" type="button">Reload</button>
  <input id="upload" type="file" accept=".csv,text/csv">
  <span id="source"></span>
</div>
<div id="amount-chart" class="chart"></div>
<div id="units-chart" class="chart"></div>
<table id="transactions">
  <thead></thead>
  <tbody></tbody>
</table>
<div class="controls">
  <button id="prev" type="button">Previous</button>
  <span id="page-label"></span>
  <button id="next" type="button">Next</button>
</div>
<script>
let page = 1;
let pageCount = 1;
let snapshot = null;

function renderGrid(columns, grid) {
  if (columns) {
    const head = document.querySelector("#transactions thead");
    head.innerHTML = "";
    const row = head.insertRow();
    for (const name of columns) {
      const th = document.createElement("th");
      th.textContent = name;
      row.appendChild(th);
    }
  }
  const body = document.querySelector("#transactions tbody");
  body.innerHTML = "";
  for (const cells of grid.rows) {
    const row = body.insertRow();
    for (const value of cells) {
      row.insertCell().textContent = value;
    }
  }
  page = grid.page;
  pageCount = grid.page_count;
  document.getElementById("page-label").textContent = `Page ${page} of ${pageCount}`;
}

function render(view) {
  snapshot = view.snapshot;
  Plotly.react("amount-chart", view.amount_chart.data, view.amount_chart.layout);
  Plotly.react("units-chart", view.units_chart.data, view.units_chart.layout);
  renderGrid(view.columns, view.grid);
  document.getElementById("source").textContent =
    `${view.source} (loaded ${new Date(view.loaded_at).toLocaleString()})`;
}

class ApiError extends Error {
  constructor(status, message) {
    super(message);
    this.status = status;
  }
}

async function call(url, options) {
  const response = await fetch(url, options);
  const body = await response.json();
  if (!response.ok) {
    throw new ApiError(response.status, body.error || response.statusText);
  }
  return body;
}

async function refresh(url, options) {
  try {
    render(await call(url, options));
  } catch (e) {
    console.error(e);
  }
}

async function showPage(number) {
  try {
    const tag = snapshot === null ? "" : `&snapshot=${snapshot}`;
    renderGrid(null, await call(`/api/grid?page=${number}${tag}`));
  } catch (e) {
    if (e.status === 409) {
      // The table was replaced since the charts were drawn; redraw everything together.
      refresh("/api/dashboard");
    } else {
      console.error(e);
    }
  }
}

document.getElementById("reload").addEventListener("click", () =>
  refresh("/api/reload", { method: "POST" }));

document.getElementById("upload").addEventListener("change", (event) => {
  const file = event.target.files[0];
  if (!file) {
    return;
  }
  refresh("/api/upload", {
    method: "POST",
    headers: { "X-File-Name": file.name, "Content-Type": "text/csv" },
    body: file,
  });
  event.target.value = "";
});

document.getElementById("prev").addEventListener("click", () => {
  if (page > 1) showPage(page - 1);
});
document.getElementById("next").addEventListener("click", () => {
  if (page < pageCount) showPage(page + 1);
});

refresh("/api/dashboard");
</script>
</body>
</html>
"##;

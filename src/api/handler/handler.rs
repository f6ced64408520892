use crate::error::LightavgError;
use crate::models::{AppState, StatsParams};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use log::{debug, error};
use std::sync::Arc;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Lighthouse Reports</title>
  </head>
  <body>
    <h1>Lighthouse Reports</h1>
    <p>Choose a job to view the Lighthouse report:</p>
    <select id="directorySelect">__OPTIONS__</select>
    <div id="stats"></div>
    <script>
      function formatValue(value, unit) {
        if (unit === 'millisecond') return (value / 1000).toFixed(1) + 's';
        if (unit === 'unitless') return value.toFixed(3);
        return value.toFixed(0) + (unit ? ' ' + unit : '');
      }

      function indicator(score) {
        if (score === null || score === undefined) return '⚪';
        return score < 0.33 ? '🔴' : score < 0.66 ? '🟡' : '🟢';
      }

      async function fetchStats(dir) {
        const statsDiv = document.getElementById('stats');
        statsDiv.innerHTML = '';
        if (!dir) return;

        const response = await fetch('/stats?dir=' + encodeURIComponent(dir));
        if (!response.ok) {
          statsDiv.textContent = 'No stats for ' + dir;
          return;
        }
        const stats = await response.json();

        for (const domain of Object.keys(stats).sort()) {
          const domainBlock = document.createElement('div');
          const domainHeading = document.createElement('h2');
          domainHeading.textContent = domain;
          domainBlock.appendChild(domainHeading);

          const metrics = stats[domain];
          for (const metric of Object.keys(metrics).sort()) {
            const m = metrics[metric];
            const min = formatValue(m.min, m.unit);
            const max = formatValue(m.max, m.unit);
            const avg = formatValue(m.avg, m.unit);

            const range = min === max ? min : '(' + min + '-' + max + ')';
            const main = avg === range ? avg : avg + ' ' + range;

            const metricHeading = document.createElement('p');
            metricHeading.textContent = indicator(m.score) + ' ' + metric + ': ' + main;
            domainBlock.appendChild(metricHeading);
          }
          statsDiv.appendChild(domainBlock);
        }
      }

      document.getElementById('directorySelect').addEventListener('change', function () {
        fetchStats(this.value);
      });
      // Automatically load the latest report
      fetchStats(__LATEST__);
    </script>
  </body>
</html>
"#;

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the job picker. `jobs` is expected most recent first.
pub fn render_index(jobs: &[String]) -> String {
    let options: String = jobs
        .iter()
        .map(|job| {
            let job = html_escape(job);
            format!(r#"<option value="{}">{}</option>"#, job, job)
        })
        .collect();
    // Job ids are directory names, so they cannot contain "</script>".
    let latest = jobs
        .first()
        .and_then(|job| serde_json::to_string(job).ok())
        .unwrap_or_else(|| "null".to_string());

    INDEX_TEMPLATE
        .replace("__OPTIONS__", &options)
        .replace("__LATEST__", &latest)
}

pub async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_jobs().await {
        Ok(jobs) => Html(render_index(&jobs)).into_response(),
        Err(e) => {
            error!("Failed to list jobs in {}: {}", state.store.root().display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list jobs").into_response()
        }
    }
}

pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Response {
    let Some(dir) = params.dir.filter(|dir| !dir.is_empty()) else {
        return not_found_handler().await.into_response();
    };

    match state.store.read_stats(&dir).await {
        Ok(stats) => ([(header::CONTENT_TYPE, "application/json")], stats).into_response(),
        Err(e) => {
            match &e {
                LightavgError::NotFound(_) | LightavgError::InvalidJobId(_) => {
                    debug!("No stats for job {:?}: {}", dir, e)
                }
                _ => error!("Failed to read stats for job {:?}: {}", dir, e),
            }
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
    }
}

pub async fn not_found_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

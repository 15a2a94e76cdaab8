//! Browser entry point: populate the current page from the sensor database.
//!
//! ```js
//! import init, { populate_page } from "./sensordb_adapter_web.js";
//! await init();
//! const page = populate_page("/sensorDb/servlet/db/");
//! // keep `page` for as long as the widgets should react to clicks
//! ```

use sensordb_app::services::markup_populator::MarkupPopulator;
use sensordb_app::services::options::{PopulatorOptions, ResultOrdering};
use sensordb_domain::time::TimestampFormat;
use wasm_bindgen::prelude::*;

mod console;
pub mod dom;
mod listeners;
pub mod service;

use dom::WebDocument;
use service::GlooSensorDbService;

/// A populated page. Its click handlers stay live while this is held; calling
/// `free()` from JavaScript turns them into no-ops.
#[wasm_bindgen]
pub struct PopulatedPage {
    _populator: MarkupPopulator<GlooSensorDbService, WebDocument>,
}

/// Populate every marker-classed element under `<body>`.
///
/// `ordering` is `"latest_request"` (default) or `"last_response"`.
/// Log timestamps are shown at `utc_offset_minutes`, defaulting to the
/// browser's current offset from UTC.
///
/// # Errors
///
/// Returns an error when there is no `window.document` or `ordering` is unknown.
#[wasm_bindgen]
pub fn populate_page(
    base_url: &str,
    ordering: Option<String>,
    utc_offset_minutes: Option<i32>,
) -> Result<PopulatedPage, JsValue> {
    console::init();

    let document = WebDocument::from_window().map_err(|err| JsValue::from_str(&err.0))?;
    let ordering = match ordering {
        Some(name) => name
            .parse::<ResultOrdering>()
            .map_err(|err| JsValue::from_str(&err.to_string()))?,
        None => ResultOrdering::default(),
    };
    let utc_offset_minutes = utc_offset_minutes.unwrap_or_else(|| {
        utc_offset_from_js(js_sys::Date::new_0().get_timezone_offset())
    });
    let options = PopulatorOptions {
        ordering,
        timestamps: TimestampFormat {
            utc_offset_minutes,
            ..TimestampFormat::default()
        },
    };
    let populator = MarkupPopulator::new(GlooSensorDbService::new(base_url), document, options);

    let running = populator.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let report = running.populate(None).await;
        tracing::info!(
            bound = report.total_bound(),
            failed = report.failures().len(),
            "populated page"
        );
    });
    Ok(PopulatedPage {
        _populator: populator,
    })
}

/// Convert `Date.getTimezoneOffset()` (UTC minus local time, in minutes)
/// into an offset east of UTC. Out-of-range values fall back to UTC.
#[allow(clippy::cast_possible_truncation)]
fn utc_offset_from_js(timezone_offset: f64) -> i32 {
    let minutes = -timezone_offset.round();
    if minutes.is_finite() && minutes.abs() < 24.0 * 60.0 {
        minutes as i32
    } else {
        0
    }
}

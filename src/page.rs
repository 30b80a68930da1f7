//! Server-rendered prediction page.
//!
//! The controls are described in Rust and the askama template only loops
//! over them, so bounds and defaults have a single source of truth in
//! [`crate::types`].

use std::collections::HashMap;

use askama::Template;

use crate::model::ModelMeta;
use crate::present::{DisplayedPrediction, Prediction};
use crate::types::{
    Airport, Carrier, FeatureInput, IntDomain, Season, ARR_CANCELLED, ARR_DIVERTED, ARR_FLIGHTS,
    DELAY_RATE_MAX, DELAY_RATE_MIN, MONTH, TOTAL_DELAY_CAUSES, YEAR,
};

pub struct SelectOption {
    pub value: &'static str,
    pub selected: bool,
}

/// One input control. Exactly one of `is_select` / `is_slider` / plain
/// number input applies.
pub struct Control {
    pub name: &'static str,
    pub label: &'static str,
    pub help: &'static str,
    pub is_select: bool,
    pub is_slider: bool,
    pub options: Vec<SelectOption>,
    pub min: String,
    pub max: String,
    pub step: &'static str,
    pub value: String,
}

impl Control {
    fn select(
        name: &'static str,
        label: &'static str,
        help: &'static str,
        codes: impl IntoIterator<Item = &'static str>,
        current: &str,
    ) -> Self {
        let options = codes
            .into_iter()
            .map(|value| SelectOption {
                value,
                selected: value == current,
            })
            .collect();
        Self {
            name,
            label,
            help,
            is_select: true,
            is_slider: false,
            options,
            min: String::new(),
            max: String::new(),
            step: "",
            value: current.to_string(),
        }
    }

    fn number(domain: IntDomain, label: &'static str, help: &'static str, value: i64) -> Self {
        Self {
            name: domain.field,
            label,
            help,
            is_select: false,
            is_slider: false,
            options: Vec::new(),
            min: domain.min.to_string(),
            max: domain.max.to_string(),
            step: "1",
            value: value.to_string(),
        }
    }

    fn slider(name: &'static str, label: &'static str, help: &'static str, value: f64) -> Self {
        Self {
            name,
            label,
            help,
            is_select: false,
            is_slider: true,
            options: Vec::new(),
            min: format!("{DELAY_RATE_MIN:.2}"),
            max: format!("{DELAY_RATE_MAX:.2}"),
            step: "0.01",
            value: format!("{value:.2}"),
        }
    }
}

/// Controls in on-page order, pre-filled from `input`.
pub fn controls(input: &FeatureInput) -> Vec<Control> {
    vec![
        Control::select(
            "carrier",
            "Airline Carrier Code",
            "Select the airline whose delay you want to predict.",
            Carrier::ALL.iter().map(|c| c.code()),
            &input.carrier,
        ),
        Control::select(
            "airport",
            "Airport Code",
            "Choose the airport for your prediction.",
            Airport::sorted().into_iter().map(|a| a.code()),
            &input.airport,
        ),
        Control::select(
            "season",
            "Season",
            "Season influences air traffic and weather patterns.",
            Season::ALL.iter().map(|s| s.code()),
            &input.season,
        ),
        Control::number(YEAR, "Year", "Enter the year for which you want to estimate delays.", input.year),
        Control::number(MONTH, "Month", "Select the month (1-12).", input.month),
        Control::number(
            ARR_FLIGHTS,
            "Arrival Flights",
            "Total incoming flights for that airline and airport.",
            input.arr_flights,
        ),
        Control::number(
            ARR_CANCELLED,
            "Cancelled Flights",
            "Number of cancelled flights that month.",
            input.arr_cancelled,
        ),
        Control::number(
            ARR_DIVERTED,
            "Diverted Flights",
            "Number of flights diverted to another airport.",
            input.arr_diverted,
        ),
        Control::slider(
            "delay_rate",
            "Historical Delay Rate",
            "Fraction of flights delayed historically.",
            input.delay_rate,
        ),
        Control::number(
            TOTAL_DELAY_CAUSES,
            "Total Delay Causes",
            "Total number of contributing delay events recorded.",
            input.total_delay_causes,
        ),
    ]
}

pub struct ResultView {
    pub shown: DisplayedPrediction,
    pub negative: bool,
}

impl From<&Prediction> for ResultView {
    fn from(p: &Prediction) -> Self {
        Self {
            shown: p.display(),
            negative: p.is_negative(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub about: &'a ModelMeta,
    pub controls: Vec<Control>,
    pub result: Option<ResultView>,
    pub error: Option<String>,
}

impl<'a> IndexPage<'a> {
    pub fn new(about: &'a ModelMeta, input: &FeatureInput) -> Self {
        Self {
            about,
            controls: controls(input),
            result: None,
            error: None,
        }
    }

    /// Puts the raw submitted text back into the controls.
    pub fn with_submitted(mut self, fields: &HashMap<String, String>) -> Self {
        for control in &mut self.controls {
            if let Some(value) = fields.get(control.name) {
                for opt in &mut control.options {
                    opt.selected = opt.value == value.as_str();
                }
                control.value = value.clone();
            }
        }
        self
    }

    pub fn with_result(mut self, prediction: &Prediction) -> Self {
        self.result = Some(prediction.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

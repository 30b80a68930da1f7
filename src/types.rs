use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

// ---------- Categorical codes ----------

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every accepted value, in listing order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn code(self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl FromStr for $name {
            type Err = InputError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err(InputError::UnknownCode {
                        field: $field,
                        code: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

code_enum! {
    /// Airline operator, listed in the order the carrier dropdown shows them.
    Carrier, "carrier" {
        American => "AA",
        Alaska => "AS",
        JetBlue => "B6",
        Delta => "DL",
        ExpressJet => "EV",
        Frontier => "F9",
        Allegiant => "G4",
        Hawaiian => "HA",
        Envoy => "MQ",
        Spirit => "NK",
        SkyWest => "OO",
        United => "UA",
        Southwest => "WN",
        Mesa => "YV",
        Endeavor => "9E",
        Horizon => "QX",
        UsAirways => "US",
    }
}

code_enum! {
    Airport, "airport" {
        Atl => "ATL",
        Lax => "LAX",
        Ord => "ORD",
        Dfw => "DFW",
        Den => "DEN",
        Jfk => "JFK",
        Sfo => "SFO",
        Sea => "SEA",
        Las => "LAS",
        Mco => "MCO",
        Clt => "CLT",
        Phx => "PHX",
        Mia => "MIA",
        Ewr => "EWR",
        Iah => "IAH",
        Bos => "BOS",
        Msp => "MSP",
        Dtw => "DTW",
        Fll => "FLL",
        Phl => "PHL",
        Bwi => "BWI",
        Slc => "SLC",
        San => "SAN",
        Mdw => "MDW",
        Tpa => "TPA",
        Dca => "DCA",
        Pdx => "PDX",
        Hnl => "HNL",
        Aus => "AUS",
    }
}

code_enum! {
    Season, "season" {
        Winter => "winter",
        Spring => "spring",
        Summer => "summer",
        Fall => "fall",
    }
}

impl Airport {
    /// Airports ordered by code, the way the dropdown lists them.
    pub fn sorted() -> Vec<Airport> {
        let mut all = Airport::ALL.to_vec();
        all.sort_by_key(|a| a.code());
        all
    }
}

// ---------- Numeric domains ----------

/// Inclusive bounds of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntDomain {
    pub field: &'static str,
    pub min: i64,
    pub max: i64,
}

impl IntDomain {
    const fn new(field: &'static str, min: i64, max: i64) -> Self {
        Self { field, min, max }
    }

    fn check(&self, value: i64) -> Result<i64, InputError> {
        if (self.min..=self.max).contains(&value) {
            Ok(value)
        } else {
            Err(InputError::OutOfRange {
                field: self.field,
                value: value.to_string(),
                min: self.min.to_string(),
                max: self.max.to_string(),
            })
        }
    }
}

pub const YEAR: IntDomain = IntDomain::new("year", 2010, 2024);
pub const MONTH: IntDomain = IntDomain::new("month", 1, 12);
pub const ARR_FLIGHTS: IntDomain = IntDomain::new("arr_flights", 1, 10_000);
pub const ARR_CANCELLED: IntDomain = IntDomain::new("arr_cancelled", 0, 1_000);
pub const ARR_DIVERTED: IntDomain = IntDomain::new("arr_diverted", 0, 1_000);
pub const TOTAL_DELAY_CAUSES: IntDomain = IntDomain::new("total_delay_causes", 0, 3_000);

pub const DELAY_RATE_MIN: f64 = 0.0;
pub const DELAY_RATE_MAX: f64 = 1.0;

fn check_delay_rate(value: f64) -> Result<f64, InputError> {
    // NaN fails the range check as well
    if (DELAY_RATE_MIN..=DELAY_RATE_MAX).contains(&value) {
        Ok(value)
    } else {
        Err(InputError::OutOfRange {
            field: "delay_rate",
            value: value.to_string(),
            min: format!("{DELAY_RATE_MIN:.1}"),
            max: format!("{DELAY_RATE_MAX:.1}"),
        })
    }
}

// ---------- Raw input ----------

/// Values as submitted by the form or the JSON API, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInput {
    pub carrier: String,
    pub airport: String,
    pub season: String,
    pub year: i64,
    pub month: i64,
    pub arr_flights: i64,
    pub arr_cancelled: i64,
    pub arr_diverted: i64,
    pub delay_rate: f64,
    pub total_delay_causes: i64,
}

impl Default for FeatureInput {
    fn default() -> Self {
        Self {
            carrier: Carrier::American.code().to_string(),
            airport: Airport::Atl.code().to_string(),
            season: Season::Winter.code().to_string(),
            year: 2018,
            month: 1,
            arr_flights: 500,
            arr_cancelled: 10,
            arr_diverted: 5,
            delay_rate: 0.20,
            total_delay_causes: 150,
        }
    }
}

impl FeatureInput {
    /// Reads the submitted form fields as text. Only presence and number
    /// syntax are checked here; domains are left to [`Self::validate`].
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, InputError> {
        fn text<'a>(form: &'a HashMap<String, String>, field: &'static str) -> Result<&'a str, InputError> {
            form.get(field)
                .map(|v| v.trim())
                .ok_or(InputError::Missing { field })
        }

        fn number<T: FromStr>(form: &HashMap<String, String>, field: &'static str) -> Result<T, InputError> {
            let raw = text(form, field)?;
            raw.parse().map_err(|_| InputError::Malformed {
                field,
                value: raw.to_string(),
            })
        }

        Ok(Self {
            carrier: text(form, "carrier")?.to_string(),
            airport: text(form, "airport")?.to_string(),
            season: text(form, "season")?.to_string(),
            year: number(form, "year")?,
            month: number(form, "month")?,
            arr_flights: number(form, "arr_flights")?,
            arr_cancelled: number(form, "arr_cancelled")?,
            arr_diverted: number(form, "arr_diverted")?,
            delay_rate: number(form, "delay_rate")?,
            total_delay_causes: number(form, "total_delay_causes")?,
        })
    }

    /// Checks every field against its domain. The first offending field is
    /// reported; nothing is clamped.
    pub fn validate(&self) -> Result<FeatureVector, InputError> {
        Ok(FeatureVector {
            year: YEAR.check(self.year)? as u16,
            month: MONTH.check(self.month)? as u8,
            arr_flights: ARR_FLIGHTS.check(self.arr_flights)? as u32,
            arr_cancelled: ARR_CANCELLED.check(self.arr_cancelled)? as u32,
            arr_diverted: ARR_DIVERTED.check(self.arr_diverted)? as u32,
            delay_rate: check_delay_rate(self.delay_rate)?,
            total_delay_causes: TOTAL_DELAY_CAUSES.check(self.total_delay_causes)? as u32,
            carrier: self.carrier.parse()?,
            airport: self.airport.parse()?,
            season: self.season.parse()?,
        })
    }
}

// ---------- Validated feature vector ----------

/// Column names in the order the model was trained on.
pub const FEATURE_NAMES: [&str; 10] = [
    "year",
    "month",
    "arr_flights",
    "arr_cancelled",
    "arr_diverted",
    "delay_rate",
    "total_delay_causes",
    "carrier",
    "airport",
    "season",
];

/// Value kind of each column in [`FEATURE_NAMES`].
pub const FEATURE_KINDS: [FeatureKind; 10] = [
    FeatureKind::Numeric,
    FeatureKind::Numeric,
    FeatureKind::Numeric,
    FeatureKind::Numeric,
    FeatureKind::Numeric,
    FeatureKind::Numeric,
    FeatureKind::Numeric,
    FeatureKind::Categorical,
    FeatureKind::Categorical,
    FeatureKind::Categorical,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Category(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

impl FeatureValue {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Int(_) | FeatureValue::Float(_) => FeatureKind::Numeric,
            FeatureValue::Category(_) => FeatureKind::Categorical,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{v}"),
            FeatureValue::Float(v) => write!(f, "{v:.3}"),
            FeatureValue::Category(c) => f.write_str(c),
        }
    }
}

/// One fully validated prediction request. Only obtainable through
/// [`FeatureInput::validate`], so every field is inside its domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    year: u16,
    month: u8,
    arr_flights: u32,
    arr_cancelled: u32,
    arr_diverted: u32,
    delay_rate: f64,
    total_delay_causes: u32,
    carrier: Carrier,
    airport: Airport,
    season: Season,
}

impl FeatureVector {
    pub fn carrier(&self) -> Carrier {
        self.carrier
    }

    pub fn airport(&self) -> Airport {
        self.airport
    }

    pub fn season(&self) -> Season {
        self.season
    }

    /// Named values in training order (matches [`FEATURE_NAMES`]).
    pub fn fields(&self) -> [(&'static str, FeatureValue); 10] {
        [
            ("year", FeatureValue::Int(self.year.into())),
            ("month", FeatureValue::Int(self.month.into())),
            ("arr_flights", FeatureValue::Int(self.arr_flights.into())),
            ("arr_cancelled", FeatureValue::Int(self.arr_cancelled.into())),
            ("arr_diverted", FeatureValue::Int(self.arr_diverted.into())),
            ("delay_rate", FeatureValue::Float(self.delay_rate)),
            ("total_delay_causes", FeatureValue::Int(self.total_delay_causes.into())),
            ("carrier", FeatureValue::Category(self.carrier.code())),
            ("airport", FeatureValue::Category(self.airport.code())),
            ("season", FeatureValue::Category(self.season.code())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_month(month: i64) -> FeatureInput {
        FeatureInput {
            month,
            ..FeatureInput::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        let fv = FeatureInput::default().validate().unwrap();
        assert_eq!(fv.carrier(), Carrier::American);
        assert_eq!(fv.airport(), Airport::Atl);
        assert_eq!(fv.season(), Season::Winter);
        let fields = fv.fields();
        assert_eq!(fields[0].1, FeatureValue::Int(2018));
        assert_eq!(fields[1].1, FeatureValue::Int(1));
        assert_eq!(fields[5].1, FeatureValue::Float(0.20));
    }

    #[test]
    fn month_boundaries() {
        assert!(with_month(1).validate().is_ok());
        assert!(with_month(12).validate().is_ok());

        for bad in [0, 13] {
            match with_month(bad).validate() {
                Err(InputError::OutOfRange { field, value, min, max }) => {
                    assert_eq!(field, "month");
                    assert_eq!(value, bad.to_string());
                    assert_eq!(min, "1");
                    assert_eq!(max, "12");
                }
                other => panic!("month={bad} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn integer_domains_are_inclusive() {
        let cases: [(IntDomain, fn(&mut FeatureInput, i64)); 6] = [
            (YEAR, |f, v| f.year = v),
            (MONTH, |f, v| f.month = v),
            (ARR_FLIGHTS, |f, v| f.arr_flights = v),
            (ARR_CANCELLED, |f, v| f.arr_cancelled = v),
            (ARR_DIVERTED, |f, v| f.arr_diverted = v),
            (TOTAL_DELAY_CAUSES, |f, v| f.total_delay_causes = v),
        ];

        for (domain, set) in cases {
            for ok in [domain.min, domain.max] {
                let mut input = FeatureInput::default();
                set(&mut input, ok);
                assert!(input.validate().is_ok(), "{} = {ok} should pass", domain.field);
            }
            for bad in [domain.min - 1, domain.max + 1] {
                let mut input = FeatureInput::default();
                set(&mut input, bad);
                let err = input.validate().unwrap_err();
                assert!(
                    matches!(err, InputError::OutOfRange { field, .. } if field == domain.field),
                    "{} = {bad} gave {err:?}",
                    domain.field
                );
            }
        }
    }

    #[test]
    fn delay_rate_bounds() {
        for ok in [0.0, 0.5, 1.0] {
            let input = FeatureInput { delay_rate: ok, ..FeatureInput::default() };
            assert!(input.validate().is_ok());
        }
        for bad in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
            let input = FeatureInput { delay_rate: bad, ..FeatureInput::default() };
            assert!(matches!(
                input.validate(),
                Err(InputError::OutOfRange { field: "delay_rate", .. })
            ));
        }
    }

    #[test]
    fn every_listed_code_is_accepted() {
        assert_eq!(Carrier::ALL.len(), 17);
        assert_eq!(Airport::ALL.len(), 29);
        assert_eq!(Season::ALL.len(), 4);

        for c in Carrier::ALL {
            let input = FeatureInput { carrier: c.code().into(), ..FeatureInput::default() };
            assert_eq!(input.validate().unwrap().carrier(), *c);
        }
        for a in Airport::ALL {
            let input = FeatureInput { airport: a.code().into(), ..FeatureInput::default() };
            assert_eq!(input.validate().unwrap().airport(), *a);
        }
        for s in Season::ALL {
            let input = FeatureInput { season: s.code().into(), ..FeatureInput::default() };
            assert_eq!(input.validate().unwrap().season(), *s);
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        let cases = [
            FeatureInput { carrier: "ZZ".into(), ..FeatureInput::default() },
            FeatureInput { carrier: "aa".into(), ..FeatureInput::default() },
            FeatureInput { airport: "XYZ".into(), ..FeatureInput::default() },
            FeatureInput { season: "Winter".into(), ..FeatureInput::default() },
            FeatureInput { season: "monsoon".into(), ..FeatureInput::default() },
        ];
        for input in cases {
            assert!(matches!(input.validate(), Err(InputError::UnknownCode { .. })));
        }
    }

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const DEFAULT_FORM: [(&str, &str); 10] = [
        ("carrier", "AA"),
        ("airport", "ATL"),
        ("season", "winter"),
        ("year", "2018"),
        ("month", "1"),
        ("arr_flights", "500"),
        ("arr_cancelled", "10"),
        ("arr_diverted", "5"),
        ("delay_rate", "0.20"),
        ("total_delay_causes", "150"),
    ];

    #[test]
    fn form_fields_parse_into_input() {
        let input = FeatureInput::from_form(&form(&DEFAULT_FORM)).unwrap();
        assert_eq!(input, FeatureInput::default());
    }

    #[test]
    fn form_reports_missing_and_malformed_fields() {
        let mut fields = form(&DEFAULT_FORM);
        fields.insert("year".into(), "soon".into());
        assert_eq!(
            FeatureInput::from_form(&fields),
            Err(InputError::Malformed { field: "year", value: "soon".into() })
        );

        fields.insert("year".into(), "2018".into());
        fields.remove("season");
        assert_eq!(
            FeatureInput::from_form(&fields),
            Err(InputError::Missing { field: "season" })
        );
    }

    #[test]
    fn airport_listing_is_sorted() {
        let sorted = Airport::sorted();
        assert_eq!(sorted.len(), 29);
        assert_eq!(sorted.first().map(|a| a.code()), Some("ATL"));
        assert_eq!(sorted.last().map(|a| a.code()), Some("TPA"));
        assert!(sorted.windows(2).all(|w| w[0].code() < w[1].code()));
    }

    #[test]
    fn fields_follow_training_order() {
        let fv = FeatureInput::default().validate().unwrap();
        let names: Vec<&str> = fv.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, FEATURE_NAMES);
        assert_eq!(fv.fields()[7].1, FeatureValue::Category("AA"));
        let kinds = fv.fields().map(|(_, v)| v.kind());
        assert_eq!(kinds, FEATURE_KINDS);
    }
}

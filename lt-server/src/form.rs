//! Form definitions and query-string parsing for the two chart pages

use lt_core::{
    error::ParamsError,
    model::{DriverCode, SessionParams, SessionType, MAX_YEAR, MIN_YEAR},
};
use serde::Serialize;

/// Drivers offered in the multi-select on both pages
pub const ROSTER: [&str; 3] = ["LEC", "NOR", "VER"];

/// Events offered on the speed page
pub const SPEED_EVENTS: [&str; 10] = [
    "Bahrain",
    "Saudi Arabia",
    "Monaco",
    "Spain",
    "Emilia Romagna",
    "Qatar",
    "Las Vegas",
    "Monza",
    "United States",
    "Abu Dhabi",
];

pub const DEFAULT_YEAR: u16 = MAX_YEAR;

/// The two chart pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    SpeedDistance,
    LongRun,
}

impl Page {
    pub fn path(&self) -> &'static str {
        match self {
            Page::SpeedDistance => "/speed-distance",
            Page::LongRun => "/long-run",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::SpeedDistance => "F1 Telemetry Visualization App",
            Page::LongRun => "Long Run Analysis - Lap Time vs Lap Number",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            Page::SpeedDistance => "Load and Visualize",
            Page::LongRun => "Load and Plot",
        }
    }

    /// Heading above the form fields, if the page has one
    pub fn form_heading(&self) -> Option<&'static str> {
        match self {
            Page::SpeedDistance => Some("Configure Telemetry Parameters"),
            Page::LongRun => None,
        }
    }

    /// Session types offered in the page's select box
    pub fn session_choices(&self) -> &'static [SessionType] {
        const LONG_RUN: [SessionType; 4] = [SessionType::FP1, SessionType::FP2, SessionType::FP3, SessionType::R];
        match self {
            Page::SpeedDistance => &SessionType::ALL,
            Page::LongRun => &LONG_RUN,
        }
    }

    /// Event choices for a select box; `None` means free text
    pub fn event_choices(&self) -> Option<&'static [&'static str]> {
        let events: &'static [&'static str] = &SPEED_EVENTS;
        match self {
            Page::SpeedDistance => Some(events),
            Page::LongRun => None,
        }
    }

    fn default_session(&self) -> SessionType {
        match self {
            Page::SpeedDistance => SessionType::Q,
            Page::LongRun => SessionType::R,
        }
    }

    fn default_event(&self) -> &'static str {
        match self {
            Page::SpeedDistance => SPEED_EVENTS[0],
            Page::LongRun => "Qatar",
        }
    }

    fn default_drivers(&self) -> &'static [&'static str] {
        match self {
            Page::SpeedDistance => &[],
            Page::LongRun => &["LEC", "NOR"],
        }
    }
}

/// Raw form values as submitted, kept as strings so the form can be
/// re-rendered exactly as the user left it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub year: String,
    pub event: String,
    pub session: String,
    pub drivers: Vec<String>,
}

impl FormInput {
    /// Values shown on a blank form
    pub fn defaults(page: Page) -> Self {
        Self {
            year: DEFAULT_YEAR.to_string(),
            event: page.default_event().to_string(),
            session: page.default_session().code().to_string(),
            drivers: page.default_drivers().iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Parse a query string such as `year=2024&event=Qatar&session=R&drivers=LEC&drivers=NOR`.
    /// Absent fields are left empty; unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut input = Self {
            year: String::new(),
            event: String::new(),
            session: String::new(),
            drivers: Vec::new(),
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "year" => input.year = value.into_owned(),
                "event" => input.event = value.into_owned(),
                "session" => input.session = value.into_owned(),
                "drivers" => input.drivers.push(value.into_owned()),
                _ => {}
            }
        }

        input
    }

    /// Validate into session parameters
    pub fn to_params(&self) -> Result<SessionParams, ParamsError> {
        let year = self.year.trim();
        if year.is_empty() {
            return Err(ParamsError::MissingField("year"));
        }
        let year: i64 = year
            .parse()
            .map_err(|_| ParamsError::InvalidYear(year.to_string()))?;

        let session = self.session.trim();
        if session.is_empty() {
            return Err(ParamsError::MissingField("session"));
        }
        let session_type: SessionType = session.parse()?;

        let drivers = self
            .drivers
            .iter()
            .map(|d| d.trim().parse::<DriverCode>())
            .collect::<Result<Vec<_>, _>>()?;

        SessionParams::new(year, &self.event, session_type, drivers)
    }

    /// Encode back into a query string with a repeated `drivers` key
    pub fn to_query(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("year", &self.year)
            .append_pair("event", &self.event)
            .append_pair("session", &self.session);
        for driver in &self.drivers {
            query.append_pair("drivers", driver);
        }
        query.finish()
    }

    pub fn has_driver(&self, code: &str) -> bool {
        self.drivers.iter().any(|d| d.eq_ignore_ascii_case(code))
    }
}

/// Text shown while a submission is loading
pub fn loading_message(params: &SessionParams) -> String {
    format!(
        "Loading session {} for {} GP in {}...",
        params.session_type, params.event, params.year
    )
}

/// Everything a client needs to build either form
#[derive(Debug, Clone, Serialize)]
pub struct FormOptions {
    pub min_year: u16,
    pub max_year: u16,
    pub default_year: u16,
    pub roster: Vec<&'static str>,
    pub speed_distance: PageOptions,
    pub long_run: PageOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageOptions {
    pub path: &'static str,
    pub submit_label: &'static str,
    /// `None` when the event is free text
    pub events: Option<Vec<&'static str>>,
    pub default_event: &'static str,
    pub session_types: Vec<&'static str>,
    pub default_session: &'static str,
    pub default_drivers: Vec<&'static str>,
}

impl PageOptions {
    fn for_page(page: Page) -> Self {
        Self {
            path: page.path(),
            submit_label: page.submit_label(),
            events: page.event_choices().map(|events| events.to_vec()),
            default_event: page.default_event(),
            session_types: page.session_choices().iter().map(|s| s.code()).collect(),
            default_session: page.default_session().code(),
            default_drivers: page.default_drivers().to_vec(),
        }
    }
}

impl FormOptions {
    pub fn current() -> Self {
        Self {
            min_year: MIN_YEAR,
            max_year: MAX_YEAR,
            default_year: DEFAULT_YEAR,
            roster: ROSTER.to_vec(),
            speed_distance: PageOptions::for_page(Page::SpeedDistance),
            long_run: PageOptions::for_page(Page::LongRun),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_page() {
        let speed = FormInput::defaults(Page::SpeedDistance);
        assert_eq!(speed.year, "2024");
        assert_eq!(speed.event, "Bahrain");
        assert_eq!(speed.session, "Q");
        assert!(speed.drivers.is_empty());

        let long_run = FormInput::defaults(Page::LongRun);
        assert_eq!(long_run.event, "Qatar");
        assert_eq!(long_run.session, "R");
        assert_eq!(long_run.drivers, vec!["LEC", "NOR"]);
    }

    #[test]
    fn test_from_query_collects_repeated_drivers() {
        let input = FormInput::from_query("year=2024&event=Abu+Dhabi&session=q&drivers=LEC&drivers=ver&extra=1");
        assert_eq!(input.event, "Abu Dhabi");
        assert_eq!(input.drivers, vec!["LEC", "ver"]);

        let params = input.to_params().unwrap();
        assert_eq!(params.year, 2024);
        assert_eq!(params.session_type, SessionType::Q);
        assert_eq!(params.drivers.len(), 2);
        assert_eq!(params.drivers[1].as_str(), "VER");
    }

    #[test]
    fn test_query_round_trip() {
        let input = FormInput::defaults(Page::LongRun);
        assert_eq!(input.to_query(), "year=2024&event=Qatar&session=R&drivers=LEC&drivers=NOR");
        assert_eq!(FormInput::from_query(&input.to_query()), input);
    }

    #[test]
    fn test_no_drivers_is_valid() {
        let params = FormInput::from_query("year=2024&event=Qatar&session=R")
            .to_params()
            .unwrap();
        assert!(params.drivers.is_empty());
    }

    #[test]
    fn test_field_errors() {
        let err = |q: &str| FormInput::from_query(q).to_params().unwrap_err();

        assert_eq!(err("event=Qatar&session=R"), ParamsError::MissingField("year"));
        assert_eq!(err("year=twenty&event=Qatar&session=R"), ParamsError::InvalidYear("twenty".into()));
        assert_eq!(err("year=1949&event=Qatar&session=R"), ParamsError::YearOutOfRange(1949));
        assert_eq!(err("year=2025&event=Qatar&session=R"), ParamsError::YearOutOfRange(2025));
        assert_eq!(err("year=2024&event=+&session=R"), ParamsError::EmptyEvent);
        assert_eq!(err("year=2024&event=Qatar"), ParamsError::MissingField("session"));
        assert_eq!(err("year=2024&event=Qatar&session=FP4"), ParamsError::UnknownSessionType("FP4".into()));
        assert_eq!(
            err("year=2024&event=Qatar&session=R&drivers=LECL"),
            ParamsError::InvalidDriverCode("LECL".into())
        );
    }

    #[test]
    fn test_loading_message() {
        let params = SessionParams::new(2024, "Abu Dhabi", SessionType::Q, vec![]).unwrap();
        assert_eq!(loading_message(&params), "Loading session Q for Abu Dhabi GP in 2024...");
    }

    #[test]
    fn test_options_match_pages() {
        let options = FormOptions::current();
        assert_eq!(options.roster, vec!["LEC", "NOR", "VER"]);
        assert_eq!(options.speed_distance.events.as_ref().map(|e| e.len()), Some(10));
        assert_eq!(options.speed_distance.session_types, vec!["FP1", "FP2", "FP3", "Q", "R"]);
        assert!(options.long_run.events.is_none());
        assert_eq!(options.long_run.session_types, vec!["FP1", "FP2", "FP3", "R"]);
        assert_eq!(options.long_run.submit_label, "Load and Plot");
    }
}

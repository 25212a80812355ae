// Query filters for the sensor read endpoints
use super::traffic::{Approach, VehicleClass};
use chrono::{NaiveDate, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start > end {
            return Err(format!("start date {} is after end date {}", start, end));
        }
        Ok(Self { start, end })
    }

    pub fn today() -> Self {
        let today = Utc::now().date_naive();
        Self {
            start: today,
            end: today,
        }
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::today()
    }
}

/// Either every value or one specific value; `All` omits the query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Filter<T> {
    pub fn selected(&self) -> Option<&T> {
        match self {
            Filter::All => None,
            Filter::Only(value) => Some(value),
        }
    }
}

impl<T: std::str::FromStr<Err = String>> Filter<T> {
    /// Parses a UI filter value where `"all"` or an empty string means no filter.
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Ok(Filter::All),
            Some(value) => value.parse().map(Filter::Only),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("all"),
            Filter::Only(value) => value.fmt(f),
        }
    }
}

pub type ApproachFilter = Filter<Approach>;
pub type ClassFilter = Filter<VehicleClass>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CountsQuery {
    pub range: DateRange,
    pub approach: ApproachFilter,
    pub class: ClassFilter,
    pub sensor_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse() {
        assert_eq!(ApproachFilter::parse(None).unwrap(), Filter::All);
        assert_eq!(ApproachFilter::parse(Some("all")).unwrap(), Filter::All);
        assert_eq!(
            ApproachFilter::parse(Some("SB")).unwrap(),
            Filter::Only(Approach::Southbound)
        );
        assert_eq!(
            ClassFilter::parse(Some("pedestrian")).unwrap(),
            Filter::Only(VehicleClass::Pedestrian)
        );
        assert!(ClassFilter::parse(Some("truck")).is_err());
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let a = NaiveDate::from_ymd_opt(2024, 7, 17).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 7, 18).unwrap();
        assert!(DateRange::new(a, b).is_ok());
        assert!(DateRange::new(a, a).is_ok());
        assert!(DateRange::new(b, a).is_err());
    }
}

// Client-side filtering and sorting for the list pages.
// Text matches are case-insensitive substrings OR-ed across fields, tag sets are AND-ed,
// thresholds compare parsed integers with <=, and every sort is stable.

use crate::api::FlightQuery;
use crate::catalog::{Destination, Flight, Hotel, Package};
use crate::pricing::parse_amount;
use crate::reviews::star_bucket;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const PACKAGE_CATEGORIES: [&str; 4] = ["Adventure", "Cultural", "Beach", "Hill Stations"];

// True when the needle is blank or any field contains it
pub fn matches_any_field(needle: &str, fields: &[&str]) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

// True when every wanted tag is present (case-insensitive equality)
pub fn contains_all_tags<T: AsRef<str>>(have: &[T], wanted: &[String]) -> bool {
    wanted.iter().all(|tag| {
        have.iter()
            .any(|candidate| candidate.as_ref().eq_ignore_ascii_case(tag))
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationSort {
    // Server order
    #[default]
    Popularity,
    Rating,
    Alphabetical,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestinationFilter {
    pub text: String,
    pub sort: DestinationSort,
}

impl DestinationFilter {
    pub fn apply(&self, destinations: &[Destination]) -> Vec<Destination> {
        let mut filtered: Vec<Destination> = destinations
            .iter()
            .filter(|d| matches_any_field(&self.text, &[&d.name, &d.location, &d.description]))
            .cloned()
            .collect();

        match self.sort {
            DestinationSort::Popularity => {}
            DestinationSort::Rating => filtered.sort_by(|a, b| {
                b.rating
                    .unwrap_or(0.0)
                    .total_cmp(&a.rating.unwrap_or(0.0))
            }),
            DestinationSort::Alphabetical => filtered.sort_by(|a, b| compare_names(&a.name, &b.name)),
        }
        filtered
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// Hotel filter criteria
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelFilter {
    pub destination: String,
    pub max_price: Option<i64>,
    pub star_rating: Option<u8>,
    pub amenities: Vec<String>,
}

impl HotelFilter {
    // Same star clicked twice clears the star filter
    pub fn toggle_star(&mut self, star: u8) {
        self.star_rating = if self.star_rating == Some(star) {
            None
        } else {
            Some(star)
        };
    }

    pub fn toggle_amenity(&mut self, amenity: &str) {
        match self
            .amenities
            .iter()
            .position(|a| a.eq_ignore_ascii_case(amenity))
        {
            Some(index) => {
                self.amenities.remove(index);
            }
            None => self.amenities.push(amenity.to_string()),
        }
    }

    pub fn matches(&self, hotel: &Hotel) -> bool {
        if !matches_any_field(&self.destination, &[&hotel.location, &hotel.name]) {
            return false;
        }

        // Unparseable prices never pass a price ceiling
        if !self.max_price.map_or(true, |max| {
            parse_amount(&hotel.price_per_night).map_or(false, |price| price <= max)
        }) {
            return false;
        }

        if !self.star_rating.map_or(true, |star| {
            hotel.average_rating.map(star_bucket) == Some(star)
        }) {
            return false;
        }

        contains_all_tags(&hotel.amenities, &self.amenities)
    }

    pub fn apply(&self, hotels: &[Hotel]) -> Vec<Hotel> {
        hotels.iter().filter(|h| self.matches(h)).cloned().collect()
    }
}

/// Flight search form. Blank text and `None` fields do not constrain the results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightFilter {
    pub from: String,
    pub to: String,
    pub departure: Option<NaiveDate>,
    pub flight_class: Option<String>,
    pub trip_type: Option<String>,
    pub passengers: Option<u32>,
}

impl FlightFilter {
    pub fn is_default(&self) -> bool {
        self.from.trim().is_empty()
            && self.to.trim().is_empty()
            && self.departure.is_none()
            && self.flight_class.is_none()
            && self.trip_type.is_none()
            && self.passengers.is_none()
    }

    pub fn matches(&self, flight: &Flight) -> bool {
        if !matches_any_field(&self.from, &[&flight.from_city]) {
            return false;
        }
        if !matches_any_field(&self.to, &[&flight.to_city]) {
            return false;
        }
        if !self.departure.map_or(true, |date| {
            flight.departure.map(|d| d.date_naive()) == Some(date)
        }) {
            return false;
        }
        if !self
            .flight_class
            .as_ref()
            .map_or(true, |class| flight.flight_class.eq_ignore_ascii_case(class))
        {
            return false;
        }
        if !self
            .trip_type
            .as_ref()
            .map_or(true, |trip| flight.trip_type.eq_ignore_ascii_case(trip))
        {
            return false;
        }
        self.passengers
            .map_or(true, |count| flight.seats_available >= count)
    }

    pub fn apply(&self, flights: &[Flight]) -> Vec<Flight> {
        if self.is_default() {
            return flights.to_vec();
        }
        flights.iter().filter(|f| self.matches(f)).cloned().collect()
    }

    // The subset of the form the flights endpoint can narrow server-side
    pub fn to_query(&self) -> FlightQuery {
        let text = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        FlightQuery {
            from_city: text(&self.from),
            to_city: text(&self.to),
            departure_date: self.departure,
            flight_class: self.flight_class.clone(),
        }
    }
}

// Default flights view before any search: departures on the given day
pub fn todays_flights(flights: &[Flight], today: NaiveDate) -> Vec<Flight> {
    flights
        .iter()
        .filter(|f| f.departure.map(|d| d.date_naive()) == Some(today))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(raw.to_string())
        }
    }

    pub fn apply(&self, packages: &[Package]) -> Vec<Package> {
        match self {
            CategoryFilter::All => packages.to_vec(),
            CategoryFilter::Only(category) => packages
                .iter()
                .filter(|p| p.category.eq_ignore_ascii_case(category))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use test_case::test_case;

    fn hotel(id: u64, name: &str, location: &str, price: &str, rating: Option<f64>, amenities: &[&str]) -> Hotel {
        Hotel {
            id,
            name: name.to_string(),
            location: location.to_string(),
            description: String::new(),
            star_rating: 3,
            price_per_night: price.to_string(),
            photo: None,
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
            rooms: vec![],
            reviews: vec![],
            average_rating: rating,
        }
    }

    fn sample_hotels() -> Vec<Hotel> {
        vec![
            hotel(1, "Goa Beach Resort", "Calangute, Goa", "5499.00", Some(4.6), &["wifi", "pool", "spa"]),
            hotel(2, "Shimla Heights", "Shimla", "3200.00", Some(4.2), &["wifi"]),
            hotel(3, "Jaipur Palace", "Jaipur", "8999.00", None, &["pool"]),
        ]
    }

    fn ids<T>(items: &[T], id: impl Fn(&T) -> u64) -> Vec<u64> {
        items.iter().map(id).collect()
    }

    #[test_case(HotelFilter { destination: "GOA".to_string(), ..Default::default() }, vec![1]; "#1 Location ignores case")]
    #[test_case(HotelFilter { max_price: Some(5499), ..Default::default() }, vec![1, 2]; "#2 Max price is inclusive")]
    #[test_case(HotelFilter { star_rating: Some(5), ..Default::default() }, vec![1]; "#3 Star bucket rounds average")]
    #[test_case(HotelFilter { star_rating: Some(4), ..Default::default() }, vec![2]; "#4 Unrated hotels never match a star")]
    #[test_case(HotelFilter { amenities: vec!["wifi".to_string(), "pool".to_string()], ..Default::default() }, vec![1]; "#5 Amenities are AND-ed")]
    #[test_case(HotelFilter { amenities: vec!["WiFi".to_string()], ..Default::default() }, vec![1, 2]; "#6 Single amenity")]
    #[test_case(HotelFilter { destination: "i".to_string(), max_price: Some(9000), amenities: vec!["pool".to_string()], ..Default::default() }, vec![3]; "#7 Combined filters")]
    #[test_case(HotelFilter::default(), vec![1, 2, 3]; "#8 Empty filter keeps all")]
    fn test_hotel_filter(filter: HotelFilter, expected: Vec<u64>) {
        let result = filter.apply(&sample_hotels());
        assert_eq!(ids(&result, |h| h.id), expected);
    }

    #[test]
    fn test_unparseable_price_fails_price_ceiling() {
        let hotels = vec![hotel(9, "Mystery Inn", "Ooty", "on request", None, &[])];
        let filter = HotelFilter {
            max_price: Some(100_000),
            ..Default::default()
        };
        assert!(filter.apply(&hotels).is_empty());
        assert_eq!(HotelFilter::default().apply(&hotels).len(), 1);
    }

    #[test]
    fn test_hotel_filter_toggles() {
        let mut filter = HotelFilter::default();
        filter.toggle_star(4);
        filter.toggle_star(4);
        assert_eq!(filter.star_rating, None);

        filter.toggle_amenity("wifi");
        filter.toggle_amenity("pool");
        filter.toggle_amenity("WIFI");
        assert_eq!(filter.amenities, vec!["pool".to_string()]);
    }

    fn destination(id: u64, name: &str, location: &str, rating: Option<f64>) -> Destination {
        Destination {
            id,
            name: name.to_string(),
            location: location.to_string(),
            description: format!("Visit {}", name),
            image: None,
            gallery: vec![],
            coords: None,
            features: vec![],
            reviews: vec![],
            rating,
        }
    }

    fn sample_destinations() -> Vec<Destination> {
        vec![
            destination(1, "manali", "Himachal Pradesh", Some(4.5)),
            destination(2, "Goa", "Goa", None),
            destination(3, "Agra", "Uttar Pradesh", Some(4.8)),
            destination(4, "Kochi", "Kerala", Some(4.5)),
        ]
    }

    #[test_case("", DestinationSort::Popularity, vec![1, 2, 3, 4]; "#1 Popularity keeps server order")]
    #[test_case("", DestinationSort::Rating, vec![3, 1, 4, 2]; "#2 Rating desc, ties stable, missing last")]
    #[test_case("", DestinationSort::Alphabetical, vec![3, 2, 4, 1]; "#3 Alphabetical ignores case")]
    #[test_case("pradesh", DestinationSort::Popularity, vec![1, 3]; "#4 Text matches location")]
    #[test_case("VISIT KOCHI", DestinationSort::Popularity, vec![4]; "#5 Text matches description")]
    #[test_case("nowhere", DestinationSort::Rating, vec![]; "#6 No match")]
    fn test_destination_filter(text: &str, sort: DestinationSort, expected: Vec<u64>) {
        let filter = DestinationFilter {
            text: text.to_string(),
            sort,
        };
        let result = filter.apply(&sample_destinations());
        assert_eq!(ids(&result, |d| d.id), expected);
    }

    fn flight(id: u64, from: &str, to: &str, departure: &str, class: &str, trip: &str, seats: u32) -> Flight {
        Flight {
            id,
            flight_number: format!("FL-{}", id),
            airline: "IndiGo".to_string(),
            from_city: from.to_string(),
            to_city: to.to_string(),
            from_airport_code: String::new(),
            to_airport_code: String::new(),
            departure: DateTime::parse_from_rfc3339(departure).ok(),
            arrival: None,
            duration_label: None,
            price: "4599".to_string(),
            seats_available: seats,
            flight_class: class.to_string(),
            trip_type: trip.to_string(),
            is_available: true,
            image: None,
        }
    }

    fn sample_flights() -> Vec<Flight> {
        vec![
            flight(1, "Delhi", "Goa", "2025-06-11T06:30:00+05:30", "Economy", "one-way", 12),
            flight(2, "Mumbai", "Delhi", "2025-06-11T23:45:00+05:30", "Business", "round-trip", 2),
            flight(3, "New Delhi", "Chennai", "2025-06-12T09:00:00+05:30", "economy", "round-trip", 40),
        ]
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test_case(FlightFilter::default(), vec![1, 2, 3]; "#1 Default form shows every flight")]
    #[test_case(FlightFilter { from: "delhi".to_string(), ..Default::default() }, vec![1, 3]; "#2 From city substring")]
    #[test_case(FlightFilter { to: "DELHI".to_string(), ..Default::default() }, vec![2]; "#3 To city substring")]
    #[test_case(FlightFilter { departure: date(2025, 6, 11), ..Default::default() }, vec![1, 2]; "#4 Departure date in local offset")]
    #[test_case(FlightFilter { flight_class: Some("economy".to_string()), ..Default::default() }, vec![1, 3]; "#5 Class ignores case")]
    #[test_case(FlightFilter { trip_type: Some("round-trip".to_string()), ..Default::default() }, vec![2, 3]; "#6 Trip type")]
    #[test_case(FlightFilter { passengers: Some(3), ..Default::default() }, vec![1, 3]; "#7 Enough seats")]
    #[test_case(FlightFilter { from: "delhi".to_string(), flight_class: Some("Economy".to_string()), passengers: Some(20), ..Default::default() }, vec![3]; "#8 Fields are AND-ed")]
    fn test_flight_filter(filter: FlightFilter, expected: Vec<u64>) {
        let result = filter.apply(&sample_flights());
        assert_eq!(ids(&result, |f| f.id), expected);
    }

    #[test]
    fn test_todays_flights() {
        let today = todays_flights(&sample_flights(), NaiveDate::from_ymd_opt(2025, 6, 12).unwrap());
        assert_eq!(ids(&today, |f| f.id), vec![3]);
    }

    #[test]
    fn test_flight_filter_to_query() {
        let filter = FlightFilter {
            from: "  Delhi ".to_string(),
            to: " ".to_string(),
            departure: date(2025, 6, 11),
            passengers: Some(2),
            ..Default::default()
        };
        let query = filter.to_query();
        assert_eq!(query.from_city.as_deref(), Some("Delhi"));
        assert_eq!(query.to_city, None);
        assert_eq!(query.departure_date, date(2025, 6, 11));
    }

    #[test_case("all", None; "#1 All")]
    #[test_case("", None; "#2 Blank means all")]
    #[test_case("beach", Some(vec![2]); "#3 Category ignores case")]
    #[test_case("Hill Stations", Some(vec![1, 3]); "#4 Multi-word category")]
    fn test_category_filter(raw: &str, expected: Option<Vec<u64>>) {
        let package = |id: u64, category: &str| Package {
            id,
            name: format!("Package {}", id),
            category: category.to_string(),
            duration_days: None,
            inclusions: vec![],
            price: "9999".to_string(),
            description: String::new(),
            photo: None,
            reviews: vec![],
        };
        let packages = vec![
            package(1, "Hill Stations"),
            package(2, "Beach"),
            package(3, "Hill Stations"),
        ];

        let result = CategoryFilter::parse(raw).apply(&packages);
        let expected = expected.unwrap_or_else(|| vec![1, 2, 3]);
        assert_eq!(ids(&result, |p| p.id), expected);
    }

    #[test]
    fn test_text_helpers() {
        assert!(matches_any_field("GOA", &["Goa Beach Resort"]));
        assert!(matches_any_field("  ", &["anything"]));
        assert!(!matches_any_field("goa", &["Shimla", "Kufri"]));

        let have = ["wifi", "pool"];
        assert!(contains_all_tags(&have, &[]));
        assert!(!contains_all_tags(&have, &["wifi".to_string(), "spa".to_string()]));
    }
}

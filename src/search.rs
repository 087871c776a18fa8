// Global search: query handling, result grouping and the dropdown state.

use crate::api::{ApiError, FlightQuery, TravelApi};
use crate::catalog::{Destination, EntityKind, Flight, Hotel, Package};
use crate::payload::WireSearchResults;
use tracing::debug;

/// A trimmed, non-empty search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    folded: String,
}

impl SearchQuery {
    // Whitespace-only input yields no query, and therefore no request
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            folded: text.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    // Case-insensitive substring match
    pub fn matches(&self, field: &str) -> bool {
        field.to_lowercase().contains(&self.folded)
    }
}

/// Lightweight summary shown in the dropdown.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub kind: EntityKind,
    pub id: u64,
    pub label: String,
    pub thumbnail: Option<String>,
}

impl SearchHit {
    pub fn route(&self) -> String {
        self.kind.detail_route(self.id)
    }
}

impl From<&Hotel> for SearchHit {
    fn from(hotel: &Hotel) -> Self {
        SearchHit {
            kind: EntityKind::Hotel,
            id: hotel.id,
            label: hotel.name.clone(),
            thumbnail: hotel.photo.clone(),
        }
    }
}

impl From<&Package> for SearchHit {
    fn from(package: &Package) -> Self {
        SearchHit {
            kind: EntityKind::Package,
            id: package.id,
            label: package.name.clone(),
            thumbnail: package.photo.clone(),
        }
    }
}

impl From<&Destination> for SearchHit {
    fn from(destination: &Destination) -> Self {
        SearchHit {
            kind: EntityKind::Destination,
            id: destination.id,
            label: destination.name.clone(),
            thumbnail: destination.image.clone(),
        }
    }
}

impl From<&Flight> for SearchHit {
    fn from(flight: &Flight) -> Self {
        SearchHit {
            kind: EntityKind::Flight,
            id: flight.id,
            label: flight.route_label(),
            thumbnail: None,
        }
    }
}

/// Results of one query, each collection in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub hotels: Vec<SearchHit>,
    pub packages: Vec<SearchHit>,
    pub destinations: Vec<SearchHit>,
    pub flights: Vec<SearchHit>,
}

impl From<WireSearchResults> for SearchResults {
    fn from(wire: WireSearchResults) -> Self {
        fn hits<W, T>(items: Vec<W>) -> Vec<SearchHit>
        where
            T: From<W>,
            for<'a> SearchHit: From<&'a T>,
        {
            items
                .into_iter()
                .map(|item| SearchHit::from(&T::from(item)))
                .collect()
        }

        SearchResults {
            hotels: hits::<_, Hotel>(wire.hotels),
            packages: hits::<_, Package>(wire.packages),
            destinations: hits::<_, Destination>(wire.destinations),
            flights: hits::<_, Flight>(wire.flights),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSection {
    pub kind: EntityKind,
    pub title: &'static str,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchView {
    NoResults,
    Sections(Vec<ResultSection>),
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty()
            && self.packages.is_empty()
            && self.destinations.is_empty()
            && self.flights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hotels.len() + self.packages.len() + self.destinations.len() + self.flights.len()
    }

    // Sections in fixed order, empty collections omitted
    pub fn view(&self) -> SearchView {
        if self.is_empty() {
            return SearchView::NoResults;
        }

        let sections = [
            (EntityKind::Hotel, "Hotels", &self.hotels),
            (EntityKind::Package, "Packages", &self.packages),
            (EntityKind::Destination, "Destinations", &self.destinations),
            (EntityKind::Flight, "Flights", &self.flights),
        ]
        .into_iter()
        .filter(|(_, _, hits)| !hits.is_empty())
        .map(|(kind, title, hits)| ResultSection {
            kind,
            title,
            hits: hits.clone(),
        })
        .collect();

        SearchView::Sections(sections)
    }
}

pub fn flight_matches(query: &SearchQuery, flight: &Flight) -> bool {
    [
        &flight.from_city,
        &flight.to_city,
        &flight.from_airport_code,
        &flight.to_airport_code,
        &flight.flight_number,
        &flight.airline,
    ]
    .iter()
    .any(|field| query.matches(field))
}

/// Builds results from the four list endpoints, fetched concurrently, using the same
/// matching rules as the search endpoint.
pub async fn fan_out_search<A: TravelApi + ?Sized>(
    api: &A,
    query: &SearchQuery,
) -> Result<SearchResults, ApiError> {
    let all_flights = FlightQuery::default();
    let (hotels, packages, destinations, flights) = futures::try_join!(
        api.list_hotels(),
        api.list_packages(),
        api.list_destinations(),
        api.list_flights(&all_flights),
    )?;

    Ok(SearchResults {
        hotels: hotels
            .iter()
            .filter(|h| query.matches(&h.name))
            .map(SearchHit::from)
            .collect(),
        packages: packages
            .iter()
            .filter(|p| query.matches(&p.name))
            .map(SearchHit::from)
            .collect(),
        destinations: destinations
            .iter()
            .filter(|d| query.matches(&d.name))
            .map(SearchHit::from)
            .collect(),
        flights: flights
            .iter()
            .filter(|f| flight_matches(query, f))
            .map(SearchHit::from)
            .collect(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    // One request to the search endpoint
    #[default]
    Endpoint,
    // Concurrent list requests filtered locally
    FanOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Inside,
    Outside,
}

/// State behind the search box and its dropdown panel.
#[derive(Debug, Default)]
pub struct SearchDropdown {
    mode: SearchMode,
    input: String,
    results: Option<SearchResults>,
    open: bool,
}

impl SearchDropdown {
    pub fn new(mode: SearchMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn results(&self) -> Option<&SearchResults> {
        self.results.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open && self.results.is_some()
    }

    // Runs the current input. Returns false when the input is blank and nothing was sent.
    pub async fn submit<A: TravelApi + ?Sized>(&mut self, api: &A) -> Result<bool, ApiError> {
        let query = match SearchQuery::parse(&self.input) {
            Some(query) => query,
            None => return Ok(false),
        };

        debug!(query = query.as_str(), mode = ?self.mode, "searching");
        let results = match self.mode {
            SearchMode::Endpoint => api.search(&query).await?,
            SearchMode::FanOut => fan_out_search(api, &query).await?,
        };
        self.show(results);
        Ok(true)
    }

    pub fn show(&mut self, results: SearchResults) {
        self.results = Some(results);
        self.open = true;
    }

    // None while the panel is closed
    pub fn view(&self) -> Option<SearchView> {
        if !self.is_open() {
            return None;
        }
        self.results.as_ref().map(SearchResults::view)
    }

    pub fn focus(&mut self) {
        if self.results.is_some() {
            self.open = true;
        }
    }

    pub fn click(&mut self, target: ClickTarget) {
        if target == ClickTarget::Outside {
            self.open = false;
        }
    }

    // Returns the detail route of the chosen hit and clears the dropdown
    pub fn select(&mut self, hit: &SearchHit) -> String {
        self.results = None;
        self.open = false;
        hit.route()
    }
}

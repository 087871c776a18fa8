// Wire shapes of the backend JSON responses.
// Every field variant the backend emits is accepted here; only the catalog and search
// conversions read these types.

use serde::{Deserialize, Serialize};

// Decimal fields arrive as strings ("24999.00") from the API and as numbers from fixtures
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WireDecimal {
    Text(String),
    Number(f64),
}

impl WireDecimal {
    pub fn into_text(self) -> String {
        match self {
            WireDecimal::Text(text) => text,
            WireDecimal::Number(number) => number.to_string(),
        }
    }
}

// Amenities and inclusions: either a JSON array or a comma separated TextField
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WireList {
    Items(Vec<String>),
    Joined(String),
}

impl WireList {
    pub fn into_items(self) -> Vec<String> {
        match self {
            WireList::Items(items) => items,
            WireList::Joined(joined) => joined
                .split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        }
    }
}

// Review authors are serialized as a plain string by some apps and as {id, username} by others
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WireAuthor {
    Name(String),
    Account { id: u64, username: String },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireReview {
    pub id: u64,
    #[serde(default)]
    pub user: Option<WireAuthor>,
    pub rating: u8,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireRoom {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub room_type: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<WireDecimal>,
    #[serde(default)]
    pub max_guests: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireHotel {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "starRating")]
    pub star_rating: Option<u8>,
    #[serde(default)]
    pub price_per_night: Option<WireDecimal>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub amenities: Option<WireList>,
    #[serde(default)]
    pub reviews: Vec<WireReview>,
    #[serde(default)]
    pub rooms: Vec<WireRoom>,
    #[serde(default)]
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WirePackage {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub inclusions: Option<WireList>,
    #[serde(default)]
    pub price: Option<WireDecimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "image")]
    pub photo: Option<String>,
    #[serde(default)]
    pub reviews: Vec<WireReview>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WireCoords {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireDestination {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "state")]
    pub location: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub gallery: Option<Vec<String>>,
    #[serde(default)]
    pub coords: Option<WireCoords>,
    #[serde(default, alias = "highlights")]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub reviews: Vec<WireReview>,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireFlight {
    pub id: u64,
    #[serde(rename = "flightNumber", alias = "flight_number", default)]
    pub flight_number: String,
    #[serde(default)]
    pub airline: String,
    #[serde(alias = "from_city", default)]
    pub from_location: String,
    #[serde(alias = "to_city", default)]
    pub to_location: String,
    #[serde(default)]
    pub from_airport_code: String,
    #[serde(default)]
    pub to_airport_code: String,
    #[serde(default)]
    pub departure: Option<String>,
    #[serde(default)]
    pub arrival: Option<String>,
    #[serde(default)]
    pub duration_hours: Option<String>,
    #[serde(default)]
    pub price: Option<WireDecimal>,
    #[serde(default)]
    pub seats_available: Option<u32>,
    #[serde(default)]
    pub flight_class: Option<String>,
    #[serde(default)]
    pub trip_type: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub destination_image: Option<String>,
}

// The flights list endpoint groups by departure date; detail and search return flat flights
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireFlightGroup {
    pub date: String,
    pub flights: Vec<WireFlight>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WireFlightList {
    Grouped(Vec<WireFlightGroup>),
    Flat(Vec<WireFlight>),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireUser {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireBooking {
    pub id: u64,
    #[serde(default, alias = "bookingType")]
    pub booking_type: Option<String>,
    #[serde(default, alias = "packageId")]
    pub package: Option<u64>,
    #[serde(default, alias = "flightId")]
    pub flight: Option<u64>,
    #[serde(default, alias = "hotelId")]
    pub hotel: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub booking_date: Option<String>,
    #[serde(default, alias = "totalAmount")]
    pub total_amount: Option<WireDecimal>,
}

// Global search response; an empty query yields `{"results": []}`, which leaves every list empty
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WireSearchResults {
    #[serde(default)]
    pub hotels: Vec<WireHotel>,
    #[serde(default)]
    pub packages: Vec<WirePackage>,
    #[serde(default)]
    pub destinations: Vec<WireDestination>,
    #[serde(default)]
    pub flights: Vec<WireFlight>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireLogin {
    pub access: String,
    pub refresh: String,
    pub user: WireUser,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireTokenRefresh {
    pub access: String,
}

// `{"message": "..."}` acknowledgements from the account endpoints
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WireMessage {
    #[serde(default)]
    pub message: String,
}

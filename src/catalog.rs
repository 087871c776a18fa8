// Normalized catalog entities.
// Every backend payload is converted here exactly once; the rest of the crate works on
// these fixed types and never looks at optional or alternative wire fields.

use crate::payload::{
    WireAuthor, WireBooking, WireDestination, WireFlight, WireFlightList, WireHotel, WirePackage,
    WireReview, WireRoom, WireUser,
};
use crate::reviews::average_rating;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The entity kinds reachable from search and detail routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Hotel,
    Package,
    Destination,
    Flight,
}

impl EntityKind {
    // Collection segment used by both the REST paths and the front-end routes
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Hotel => "hotels",
            EntityKind::Package => "packages",
            EntityKind::Destination => "destinations",
            EntityKind::Flight => "flights",
        }
    }

    pub fn detail_route(&self, id: u64) -> String {
        format!("/{}/{}", self.collection(), id)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Hotel => "hotel",
            EntityKind::Package => "package",
            EntityKind::Destination => "destination",
            EntityKind::Flight => "flight",
        };
        f.write_str(label)
    }
}

/// The three kinds that can be purchased at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookableKind {
    Package,
    Flight,
    Hotel,
}

impl From<BookableKind> for EntityKind {
    fn from(kind: BookableKind) -> Self {
        match kind {
            BookableKind::Package => EntityKind::Package,
            BookableKind::Flight => EntityKind::Flight,
            BookableKind::Hotel => EntityKind::Hotel,
        }
    }
}

impl fmt::Display for BookableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        EntityKind::from(*self).fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: u64,
    pub author: String,
    pub rating: u8,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<WireReview> for Review {
    fn from(wire: WireReview) -> Self {
        let author = match wire.user {
            Some(WireAuthor::Name(name)) => name,
            Some(WireAuthor::Account { username, .. }) => username,
            None => String::new(),
        };
        Review {
            id: wire.id,
            author,
            rating: wire.rating,
            text: wire.text,
            created_at: wire.created_at.as_deref().and_then(parse_utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: u64,
    pub room_type: String,
    pub description: String,
    pub price: String,
    pub max_guests: u32,
    pub image: Option<String>,
}

impl From<WireRoom> for Room {
    fn from(wire: WireRoom) -> Self {
        Room {
            id: wire.id,
            room_type: wire.room_type,
            description: wire.description,
            price: wire.price.map(|p| p.into_text()).unwrap_or_default(),
            max_guests: wire.max_guests.unwrap_or(2),
            image: wire.image,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotel {
    pub id: u64,
    pub name: String,
    pub location: String,
    pub description: String,
    pub star_rating: u8,
    // Decimal string as served; parsed only where arithmetic is needed
    pub price_per_night: String,
    pub photo: Option<String>,
    pub amenities: Vec<String>,
    pub rooms: Vec<Room>,
    pub reviews: Vec<Review>,
    pub average_rating: Option<f64>,
}

impl From<WireHotel> for Hotel {
    fn from(wire: WireHotel) -> Self {
        let reviews: Vec<Review> = wire.reviews.into_iter().map(Review::from).collect();
        let average_rating = wire.average_rating.or_else(|| average_rating(&reviews));
        Hotel {
            id: wire.id,
            name: wire.name,
            location: wire.location.unwrap_or_default(),
            description: wire.description.unwrap_or_default(),
            star_rating: wire.star_rating.unwrap_or(3),
            price_per_night: wire
                .price_per_night
                .map(|p| p.into_text())
                .unwrap_or_default(),
            photo: wire.photo,
            amenities: wire.amenities.map(|a| a.into_items()).unwrap_or_default(),
            rooms: wire.rooms.into_iter().map(Room::from).collect(),
            reviews,
            average_rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub duration_days: Option<u32>,
    pub inclusions: Vec<String>,
    pub price: String,
    pub description: String,
    pub photo: Option<String>,
    pub reviews: Vec<Review>,
}

impl From<WirePackage> for Package {
    fn from(wire: WirePackage) -> Self {
        Package {
            id: wire.id,
            name: wire.name,
            category: wire.category.unwrap_or_default(),
            duration_days: wire.duration,
            inclusions: wire.inclusions.map(|i| i.into_items()).unwrap_or_default(),
            price: wire.price.map(|p| p.into_text()).unwrap_or_default(),
            description: wire.description.unwrap_or_default(),
            photo: wire.photo,
            reviews: wire.reviews.into_iter().map(Review::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub id: u64,
    pub name: String,
    pub location: String,
    pub description: String,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    pub coords: Option<Coordinates>,
    pub features: Vec<String>,
    pub reviews: Vec<Review>,
    pub rating: Option<f64>,
}

impl From<WireDestination> for Destination {
    fn from(wire: WireDestination) -> Self {
        let reviews: Vec<Review> = wire.reviews.into_iter().map(Review::from).collect();
        let rating = wire.rating.or_else(|| average_rating(&reviews));
        Destination {
            id: wire.id,
            name: wire.name,
            location: wire.location.unwrap_or_default(),
            description: wire.description.unwrap_or_default(),
            image: wire.image,
            gallery: wire.gallery.unwrap_or_default(),
            coords: wire.coords.map(|c| Coordinates {
                lat: c.lat,
                lng: c.lng,
            }),
            features: wire.features.unwrap_or_default(),
            reviews,
            rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub id: u64,
    pub flight_number: String,
    pub airline: String,
    pub from_city: String,
    pub to_city: String,
    pub from_airport_code: String,
    pub to_airport_code: String,
    pub departure: Option<DateTime<FixedOffset>>,
    pub arrival: Option<DateTime<FixedOffset>>,
    pub duration_label: Option<String>,
    pub price: String,
    pub seats_available: u32,
    pub flight_class: String,
    pub trip_type: String,
    pub is_available: bool,
    pub image: Option<String>,
}

impl Flight {
    pub fn route_label(&self) -> String {
        format!("{} → {} ({})", self.from_city, self.to_city, self.airline)
    }
}

impl From<WireFlight> for Flight {
    fn from(wire: WireFlight) -> Self {
        Flight {
            id: wire.id,
            flight_number: wire.flight_number,
            airline: wire.airline,
            from_city: wire.from_location,
            to_city: wire.to_location,
            from_airport_code: wire.from_airport_code,
            to_airport_code: wire.to_airport_code,
            departure: wire.departure.as_deref().and_then(parse_offset),
            arrival: wire.arrival.as_deref().and_then(parse_offset),
            duration_label: wire.duration_hours,
            price: wire.price.map(|p| p.into_text()).unwrap_or_default(),
            seats_available: wire.seats_available.unwrap_or(0),
            flight_class: wire.flight_class.unwrap_or_default(),
            trip_type: wire.trip_type.unwrap_or_else(|| "round-trip".to_string()),
            is_available: wire.is_available.unwrap_or(true),
            image: wire.destination_image,
        }
    }
}

// Flattens the date-grouped listing, keeping the server's date and in-group order
pub fn flatten_flights(list: WireFlightList) -> Vec<Flight> {
    match list {
        WireFlightList::Grouped(groups) => groups
            .into_iter()
            .flat_map(|group| group.flights)
            .map(Flight::from)
            .collect(),
        WireFlightList::Flat(flights) => flights.into_iter().map(Flight::from).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        User {
            id: wire.id,
            username: wire.username,
            email: wire.email,
            first_name: wire.first_name.unwrap_or_default(),
            last_name: wire.last_name.unwrap_or_default(),
            phone: wire.phone.filter(|p| !p.is_empty()),
        }
    }
}

/// A persisted booking as acknowledged by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: u64,
    pub kind: Option<BookableKind>,
    pub item_id: Option<u64>,
    pub status: String,
    pub booked_at: Option<DateTime<Utc>>,
    pub total_amount: Option<String>,
}

impl Booking {
    pub fn confirmation_route(&self) -> String {
        format!("/booking-confirmation/{}", self.id)
    }
}

impl From<WireBooking> for Booking {
    fn from(wire: WireBooking) -> Self {
        let kind = match wire.booking_type.as_deref() {
            Some("package") => Some(BookableKind::Package),
            Some("flight") => Some(BookableKind::Flight),
            Some("hotel") => Some(BookableKind::Hotel),
            _ if wire.package.is_some() => Some(BookableKind::Package),
            _ if wire.flight.is_some() => Some(BookableKind::Flight),
            _ if wire.hotel.is_some() => Some(BookableKind::Hotel),
            _ => None,
        };
        Booking {
            id: wire.id,
            kind,
            item_id: wire.package.or(wire.flight).or(wire.hotel),
            status: wire.status.unwrap_or_else(|| "pending".to_string()),
            booked_at: wire.booking_date.as_deref().and_then(parse_utc),
            total_amount: wire.total_amount.map(|t| t.into_text()),
        }
    }
}

/// The item being purchased at checkout. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingItem {
    pub kind: BookableKind,
    pub id: u64,
    pub name: String,
    pub unit_price: String,
    pub image: Option<String>,
    pub duration_days: Option<u32>,
}

impl BookingItem {
    // Shown under the item name: "7 Days / 6 Nights"
    pub fn duration_label(&self) -> Option<String> {
        self.duration_days
            .filter(|days| *days > 0)
            .map(|days| format!("{} Days / {} Nights", days, days - 1))
    }

    // Demo item used when checkout is opened without a selection
    pub fn fallback() -> Self {
        BookingItem {
            kind: BookableKind::Package,
            id: 1,
            name: "Kashmir Paradise Package".to_string(),
            unit_price: "24999".to_string(),
            image: Some("https://images.unsplash.com/photo-1506905925346-21bda4d32df4".to_string()),
            duration_days: Some(7),
        }
    }
}

impl From<&Package> for BookingItem {
    fn from(package: &Package) -> Self {
        BookingItem {
            kind: BookableKind::Package,
            id: package.id,
            name: package.name.clone(),
            unit_price: package.price.clone(),
            image: package.photo.clone(),
            duration_days: package.duration_days,
        }
    }
}

impl From<&Hotel> for BookingItem {
    fn from(hotel: &Hotel) -> Self {
        BookingItem {
            kind: BookableKind::Hotel,
            id: hotel.id,
            name: hotel.name.clone(),
            unit_price: hotel.price_per_night.clone(),
            image: hotel.photo.clone(),
            duration_days: None,
        }
    }
}

impl From<&Flight> for BookingItem {
    fn from(flight: &Flight) -> Self {
        BookingItem {
            kind: BookableKind::Flight,
            id: flight.id,
            name: format!("{} {}", flight.airline, flight.flight_number),
            unit_price: flight.price.clone(),
            image: flight.image.clone(),
            duration_days: None,
        }
    }
}

fn parse_offset(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    parse_offset(value).map(|dt| dt.with_timezone(&Utc))
}

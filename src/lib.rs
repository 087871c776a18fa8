// Core library of the travel booking client

pub mod api;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod filter;
pub mod forms;
pub mod payload; // Wire formats, only read by the catalog conversions
pub mod pricing;
pub mod reviews;
pub mod search;
pub mod weather;

// Re-export key types for convenience
pub use api::{ApiError, ClientConfig, ClientError, FlightQuery, HttpTravelApi, TravelApi};
pub use auth::{AuthSession, Credentials, SessionState};
pub use catalog::{
    BookableKind, Booking, BookingItem, Destination, EntityKind, Flight, Hotel, Package, Review,
    User,
};
pub use checkout::{BookingRequest, CheckoutError, CheckoutSelection, CheckoutSession, Confirmation};
pub use filter::{CategoryFilter, DestinationFilter, DestinationSort, FlightFilter, HotelFilter};
pub use forms::{ContactForm, PaymentMethod, TravelerForm, ValidationError};
pub use pricing::{PriceBreakdown, PricingPolicy, TravelerCount};
pub use search::{SearchDropdown, SearchMode, SearchQuery, SearchResults, SearchView};
pub use weather::{CurrentWeather, WeatherClient, WeatherError, WeatherLocation};

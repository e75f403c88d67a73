//! Error types for the view engine.

use thiserror::Error;


/// Errors surfaced by the view engine.
///
/// None of these are fatal: every path that returns one leaves the last good
/// rendering in place.
#[derive( Debug, Error, PartialEq )]
pub enum ViewError {
    #[error( "Request failed: {0}" )]
    Transport( String ),

    #[error( "Response carried neither a result nor an error" )]
    EmptyResponse,

    #[error( "Malformed record: {0}" )]
    MalformedRecord( String ),

    #[error( "Unknown view: {0}" )]
    UnknownView( String ),

    #[error( "No container for view {0}" )]
    NoContainer( String ),
}

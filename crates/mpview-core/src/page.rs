//! Page results and records
//!
//! The shapes the transport hands to the engine: a page of records plus the
//! counters needed for pagination, or an error object that suppresses
//! reconciliation entirely.

use std::collections::HashMap;
use std::fmt;

use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };

use crate::error::ViewError;
use crate::view::ViewId;


/// Discriminator carried by every record in the `Type` field.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize )]
#[serde( rename_all = "lowercase" )]
pub enum EntryType {
    Song,
    Dir,
    Stream,
    Webradio,
    Plist,
    Smartpls,
    Album,
    Disc,
    Work,
}


impl EntryType {
    /// Parses the wire name of an entry type.
    pub fn from_name( name: &str ) -> Option<Self> {
        match name {
            "song" => Some( EntryType::Song ),
            "dir" => Some( EntryType::Dir ),
            "stream" => Some( EntryType::Stream ),
            "webradio" => Some( EntryType::Webradio ),
            "plist" => Some( EntryType::Plist ),
            "smartpls" => Some( EntryType::Smartpls ),
            "album" => Some( EntryType::Album ),
            "disc" => Some( EntryType::Disc ),
            "work" => Some( EntryType::Work ),
            _ => None,
        }
    }


    /// Returns the wire name.
    pub fn name( &self ) -> &'static str {
        match self {
            EntryType::Song => "song",
            EntryType::Dir => "dir",
            EntryType::Stream => "stream",
            EntryType::Webradio => "webradio",
            EntryType::Plist => "plist",
            EntryType::Smartpls => "smartpls",
            EntryType::Album => "album",
            EntryType::Disc => "disc",
            EntryType::Work => "work",
        }
    }
}


impl fmt::Display for EntryType {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        f.write_str( self.name() )
    }
}


/// One entry of a page: a JSON object keyed by field name.
#[derive( Debug, Clone, Default, PartialEq, Serialize, Deserialize )]
#[serde( transparent )]
pub struct Record( Map<String, Value> );


impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }


    /// Gets the raw value of a field.
    pub fn get( &self, field: &str ) -> Option<&Value> {
        self.0.get( field )
    }


    /// Sets a field, replacing any previous value.
    pub fn insert( &mut self, field: impl Into<String>, value: Value ) {
        self.0.insert( field.into(), value );
    }


    /// Gets a field as a string slice.
    pub fn str( &self, field: &str ) -> Option<&str> {
        self.0.get( field ).and_then( Value::as_str )
    }


    /// Gets a field as an unsigned integer.
    pub fn u64( &self, field: &str ) -> Option<u64> {
        self.0.get( field ).and_then( Value::as_u64 )
    }


    /// Returns the entry type, if the record carries a known one.
    pub fn entry_type( &self ) -> Option<EntryType> {
        self.str( "Type" ).and_then( EntryType::from_name )
    }


    /// Returns the record uri.
    pub fn uri( &self ) -> Option<&str> {
        self.str( "uri" )
    }


    /// Returns the 0-indexed position, if any.
    pub fn pos( &self ) -> Option<usize> {
        self.u64( "Pos" ).and_then( |p| usize::try_from( p ).ok() )
    }


    /// Returns the display name: `Title`, falling back to `name` and `Name`.
    pub fn display_name( &self ) -> Option<&str> {
        self.str( "Title" )
            .or_else( || self.str( "name" ) )
            .or_else( || self.str( "Name" ) )
            .or_else( || self.str( "Value" ) )
    }


    /// Iterates over the fields.
    pub fn iter( &self ) -> impl Iterator<Item = ( &String, &Value )> {
        self.0.iter()
    }
}


impl From<Map<String, Value>> for Record {
    fn from( map: Map<String, Value> ) -> Self {
        Self( map )
    }
}


impl TryFrom<Value> for Record {
    type Error = ViewError;


    fn try_from( value: Value ) -> Result<Self, Self::Error> {
        match value {
            Value::Object( map ) => Ok( Self( map ) ),
            other => Err( ViewError::MalformedRecord( format!( "expected object, got {}", other ) ) ),
        }
    }
}


/// A page of records as returned by a list request.
#[derive( Debug, Clone, Default, PartialEq, Serialize, Deserialize )]
#[serde( rename_all = "camelCase" )]
pub struct PageResult {
    pub offset: usize,
    pub limit: usize,
    /// -1 when the total is unknown.
    pub total_entities: i64,
    pub returned_entities: usize,
    #[serde( default )]
    pub data: Vec<Record>,

    // Album detail extras
    #[serde( rename = "AlbumId", default, skip_serializing_if = "Option::is_none" )]
    pub album_id: Option<String>,
    #[serde( rename = "Album", default, skip_serializing_if = "Option::is_none" )]
    pub album: Option<String>,
    #[serde( rename = "DiscCount", default, skip_serializing_if = "Option::is_none" )]
    pub disc_count: Option<u32>,
}


impl PageResult {
    /// Builds a page from records, deriving `returnedEntities`.
    pub fn new( offset: usize, limit: usize, total_entities: i64, data: Vec<Record> ) -> Self {
        Self {
            offset,
            limit,
            total_entities,
            returned_entities: data.len(),
            data,
            ..Self::default()
        }
    }


    /// Returns true if `returnedEntities` agrees with the data length.
    pub fn is_consistent( &self ) -> bool {
        self.returned_entities == self.data.len()
    }
}


/// Error object of a failed request.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
pub struct ResponseError {
    pub message: String,
    #[serde( default )]
    pub data: Value,
}


/// A transport response: either a page or an error.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
pub struct Response {
    #[serde( default, skip_serializing_if = "Option::is_none" )]
    pub result: Option<PageResult>,
    #[serde( default, skip_serializing_if = "Option::is_none" )]
    pub error: Option<ResponseError>,
}


impl Response {
    /// Wraps a successful page.
    pub fn ok( page: PageResult ) -> Self {
        Self { result: Some( page ), error: None }
    }


    /// Wraps an error.
    pub fn err( message: impl Into<String> ) -> Self {
        Self {
            result: None,
            error: Some( ResponseError { message: message.into(), data: Value::Null } ),
        }
    }


    /// Returns the page, or the error as a `ViewError`.
    ///
    /// An error marker wins over a result, so a half-filled response never
    /// reaches the reconciler.
    pub fn page( &self ) -> Result<&PageResult, ViewError> {
        if let Some( err ) = &self.error {
            return Err( ViewError::Transport( err.message.clone() ) );
        }
        self.result.as_ref().ok_or( ViewError::EmptyResponse )
    }
}


/// Pagination footer state kept by a container after each pass.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
    pub total: i64,
    pub returned: usize,
}


impl Pagination {
    /// Returns the entity count label shown in the footer.
    ///
    /// Known totals are printed as is; an unknown total prints the returned
    /// count, or `> max` when the page came back full.
    pub fn label( &self, max_per_page: usize ) -> String {
        if self.total > -1 {
            self.total.to_string()
        } else if self.returned + self.offset < max_per_page {
            self.returned.to_string()
        } else {
            format!( "> {}", max_per_page )
        }
    }


    /// Returns true if a further page may exist.
    pub fn has_next( &self ) -> bool {
        if self.total > -1 {
            ( self.offset + self.returned ) < self.total as usize
        } else {
            self.returned >= self.limit
        }
    }
}


/// Client-side windowing used by views whose source returns everything at once.
///
/// Drops the leading `offset - 1` records (not `offset`) and truncates the rest
/// to `limit`, then fixes up `returnedEntities`. The one-short drop is what the
/// directory view has always shown, so it is kept.
pub fn paginate_window( mut page: PageResult, offset: usize, limit: usize ) -> PageResult {
    if offset > 0 {
        let drop = ( offset - 1 ).min( page.data.len() );
        page.data.drain( ..drop );
    }
    if page.data.len() > limit {
        page.data.truncate( limit );
    }
    page.offset = offset;
    page.limit = limit;
    page.returned_entities = page.data.len();
    page
}


/// Per-view request counters for discarding stale responses.
#[derive( Debug, Default )]
pub struct RequestSequence {
    latest: HashMap<ViewId, u64>,
}


impl RequestSequence {
    /// Creates an empty sequence table.
    pub fn new() -> Self {
        Self::default()
    }


    /// Stamps a new request for the view and returns its sequence number.
    pub fn next( &mut self, view: ViewId ) -> u64 {
        let seq = self.latest.entry( view ).or_insert( 0 );
        *seq += 1;
        *seq
    }


    /// Returns true if `seq` is the most recent request issued for the view.
    pub fn is_current( &self, view: ViewId, seq: u64 ) -> bool {
        self.latest.get( &view ).copied() == Some( seq )
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use serde_json::json;


    fn records( n: usize ) -> Vec<Record> {
        ( 0..n )
            .map( |i| Record::try_from( json!({ "uri": format!( "song{}", i ), "Type": "song" }) ).unwrap() )
            .collect()
    }


    #[test]
    fn test_page_deserializes_camel_case() {
        let page: PageResult = serde_json::from_value( json!({
            "offset": 0,
            "limit": 2,
            "totalEntities": 3,
            "returnedEntities": 2,
            "data": [ { "uri": "a", "Type": "song" }, { "uri": "b", "Type": "song" } ],
        }) ).unwrap();
        assert_eq!( page.total_entities, 3 );
        assert_eq!( page.data[ 1 ].uri(), Some( "b" ) );
        assert_eq!( page.data[ 0 ].entry_type(), Some( EntryType::Song ) );
        assert!( page.is_consistent() );
    }


    #[test]
    fn test_response_error_wins() {
        let resp: Response = serde_json::from_value( json!({
            "error": { "message": "No such playlist", "data": {} }
        }) ).unwrap();
        assert!( matches!( resp.page(), Err( ViewError::Transport( m ) ) if m == "No such playlist" ) );
    }


    #[test]
    fn test_record_rejects_non_object() {
        assert!( Record::try_from( json!( [ 1, 2 ] ) ).is_err() );
    }


    #[test]
    fn test_paginate_window_offset_one_drops_nothing() {
        let page = PageResult::new( 0, 100, 5, records( 5 ) );
        let windowed = paginate_window( page, 1, 2 );
        assert_eq!( windowed.returned_entities, 2 );
        assert_eq!( windowed.data[ 0 ].uri(), Some( "song0" ) );
    }


    #[test]
    fn test_paginate_window_drops_offset_minus_one() {
        let page = PageResult::new( 0, 100, 5, records( 5 ) );
        let windowed = paginate_window( page, 3, 10 );
        assert_eq!( windowed.returned_entities, 3 );
        assert_eq!( windowed.data[ 0 ].uri(), Some( "song2" ) );
        assert_eq!( windowed.offset, 3 );
    }


    #[test]
    fn test_pagination_label() {
        let known = Pagination { offset: 0, limit: 10, total: 42, returned: 10 };
        assert_eq!( known.label( 10 ), "42" );

        let partial = Pagination { offset: 0, limit: 10, total: -1, returned: 4 };
        assert_eq!( partial.label( 10 ), "4" );
        assert!( !partial.has_next() );

        let full = Pagination { offset: 0, limit: 10, total: -1, returned: 10 };
        assert_eq!( full.label( 10 ), "> 10" );
        assert!( full.has_next() );
    }


    #[test]
    fn test_request_sequence_discards_stale() {
        let mut seq = RequestSequence::new();
        let first = seq.next( ViewId::QueueCurrent );
        let second = seq.next( ViewId::QueueCurrent );
        assert!( !seq.is_current( ViewId::QueueCurrent, first ) );
        assert!( seq.is_current( ViewId::QueueCurrent, second ) );
        assert!( !seq.is_current( ViewId::Search, 1 ) );
    }
}

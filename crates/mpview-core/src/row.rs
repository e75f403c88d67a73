//! Rendered rows
//!
//! A row is one node of a container's rendering tree, bound by ordinal
//! position to a record of the last rendered page.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{ AtomicU64, Ordering };

use crate::page::{ EntryType, Record };
use crate::render::{ ActionLink, Content };


static NEXT_NODE_ID: AtomicU64 = AtomicU64::new( 1 );


/// Process-unique identity of a rendering node.
///
/// Survives in-place replacement of the node's content, so a slot that is
/// reused across refreshes keeps its id.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord )]
pub struct NodeId( u64 );


impl NodeId {
    /// Allocates a new id.
    pub fn fresh() -> Self {
        Self( NEXT_NODE_ID.fetch_add( 1, Ordering::Relaxed ) )
    }


    /// Returns the raw value.
    pub fn get( &self ) -> u64 {
        self.0
    }
}


/// Key that tells an entry apart from its neighbors.
///
/// Keys of different kinds never compare equal.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum Identity<'a> {
    Uri( &'a str ),

    /// Albums carry no uri; the id is paired with the position when known.
    Album { id: &'a str, pos: Option<usize> },

    /// Entries of a tag list, keyed by tag value.
    Tag( &'a str ),

    Pos( usize ),
}


/// Identity side-data attached to a row before it is rendered.
///
/// Action handlers read this instead of re-querying the record.
#[derive( Debug, Clone, Default, PartialEq, Eq )]
pub struct EntryData {
    pub uri: Option<String>,
    pub entry_type: Option<EntryType>,
    pub name: Option<String>,
    pub pos: Option<usize>,

    /// View-specific extras (`AlbumId`, browse tags, disc number, ...).
    pub extras: BTreeMap<String, String>,
}


impl EntryData {
    /// Extracts identity data from a record.
    pub fn from_record( record: &Record ) -> Self {
        let mut data = Self {
            uri: record.uri().map( str::to_string ),
            entry_type: record.entry_type(),
            name: record.display_name().map( str::to_string ),
            pos: record.pos(),
            extras: BTreeMap::new(),
        };
        for key in [ "AlbumId", "Value" ] {
            if let Some( value ) = record.str( key ) {
                data.extras.insert( key.to_string(), value.to_string() );
            }
        }
        data
    }


    /// Returns the entry's identity: the uri, else the album id and
    /// position, else the tag value, else the position alone.
    pub fn identity( &self ) -> Option<Identity<'_>> {
        if let Some( uri ) = &self.uri {
            return Some( Identity::Uri( uri ) );
        }
        if let Some( id ) = self.extra( "AlbumId" ) {
            return Some( Identity::Album { id, pos: self.pos } );
        }
        if let Some( value ) = self.extra( "Value" ) {
            return Some( Identity::Tag( value ) );
        }
        self.pos.map( Identity::Pos )
    }


    /// Copies the listed tags into the extras when present and non-empty.
    pub fn with_tags( mut self, record: &Record, tags: &[String] ) -> Self {
        for tag in tags {
            if let Some( value ) = record.str( tag ).filter( |v| !v.is_empty() ) {
                self.extras.insert( tag.clone(), value.to_string() );
            }
        }
        self
    }


    /// Fills every field that is still unset from `other`.
    ///
    /// Values a per-row hook already attached win over the record's own.
    pub fn absorb( &mut self, other: EntryData ) {
        if self.uri.is_none() { self.uri = other.uri; }
        if self.entry_type.is_none() { self.entry_type = other.entry_type; }
        if self.name.is_none() { self.name = other.name; }
        if self.pos.is_none() { self.pos = other.pos; }
        for ( key, value ) in other.extras {
            self.extras.entry( key ).or_insert( value );
        }
    }


    /// Returns an extra value.
    pub fn extra( &self, key: &str ) -> Option<&str> {
        self.extras.get( key ).map( String::as_str )
    }
}


/// One node of the rendering tree.
#[derive( Debug, Clone )]
pub struct RenderedRow {
    id: NodeId,
    pub data: EntryData,
    pub content: Content,
    pub actions: Vec<ActionLink>,

    /// Selection marker, only meaningful while the container is in select mode.
    pub selected: bool,

    /// Highlights the currently playing entry.
    pub playing: bool,

    /// Divider and footer rows ignore activation and context menus.
    pub not_clickable: bool,

    /// Hidden optimistically after a successful drop.
    pub hidden: bool,

    /// Reduced opacity while being dragged.
    pub dimmed: bool,

    /// Hover indicator while a drag passes over the row.
    pub drag_over: bool,
}


impl RenderedRow {
    /// Creates an empty row with a fresh id.
    pub fn new() -> Self {
        Self {
            id: NodeId::fresh(),
            data: EntryData::default(),
            content: Content::Empty,
            actions: Vec::new(),
            selected: false,
            playing: false,
            not_clickable: false,
            hidden: false,
            dimmed: false,
            drag_over: false,
        }
    }


    /// Returns the node id.
    pub fn id( &self ) -> NodeId {
        self.id
    }


    /// Overwrites this node with `other`, keeping this node's id.
    pub fn replace_with( &mut self, other: RenderedRow ) {
        let id = self.id;
        *self = other;
        self.id = id;
    }


    /// Clears rendered content, keeping identity data and flags.
    pub fn clear_content( &mut self ) {
        self.content = Content::Empty;
        self.actions.clear();
    }
}


impl Default for RenderedRow {
    fn default() -> Self {
        Self::new()
    }
}


/// Content dump used to compare renderings; the node id is left out.
impl fmt::Display for RenderedRow {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        let mut flags = Vec::new();
        if self.selected { flags.push( "selected" ); }
        if self.playing { flags.push( "playing" ); }
        if self.not_clickable { flags.push( "not-clickable" ); }
        if self.hidden { flags.push( "hidden" ); }
        if self.dimmed { flags.push( "dimmed" ); }
        if self.drag_over { flags.push( "dragover" ); }

        write!(
            f,
            "<{} uri={} pos={} [{}]> {}",
            self.data.entry_type.map( |t| t.name() ).unwrap_or( "-" ),
            self.data.uri.as_deref().unwrap_or( "-" ),
            self.data.pos.map( |p| p.to_string() ).unwrap_or_else( || "-".to_string() ),
            flags.join( "," ),
            self.content,
        )?;
        for action in &self.actions {
            write!( f, " ({})", action.action )?;
        }
        Ok(())
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use serde_json::json;


    #[test]
    fn test_replace_keeps_id() {
        let mut slot = RenderedRow::new();
        let id = slot.id();
        let mut other = RenderedRow::new();
        other.data.uri = Some( "b".to_string() );
        assert_ne!( other.id(), id );

        slot.replace_with( other );
        assert_eq!( slot.id(), id );
        assert_eq!( slot.data.uri.as_deref(), Some( "b" ) );
    }


    #[test]
    fn test_entry_data_from_record() {
        let rec = Record::try_from( json!({
            "uri": "x.mp3", "Type": "song", "Title": "X", "Pos": 4, "AlbumId": "9", "Genre": "Jazz", "Album": ""
        }) ).unwrap();
        let data = EntryData::from_record( &rec )
            .with_tags( &rec, &[ "Genre".to_string(), "Album".to_string() ] );
        assert_eq!( data.uri.as_deref(), Some( "x.mp3" ) );
        assert_eq!( data.entry_type, Some( EntryType::Song ) );
        assert_eq!( data.name.as_deref(), Some( "X" ) );
        assert_eq!( data.pos, Some( 4 ) );
        assert_eq!( data.extra( "AlbumId" ), Some( "9" ) );
        assert_eq!( data.extra( "Genre" ), Some( "Jazz" ) );
        assert_eq!( data.extra( "Album" ), None );
    }


    #[test]
    fn test_absorb_keeps_hook_values() {
        let mut data = EntryData {
            name: Some( "hooked".to_string() ),
            ..EntryData::default()
        };
        data.extras.insert( "AlbumId".to_string(), "1".to_string() );

        let rec = Record::try_from( json!({ "uri": "y", "Title": "Y", "AlbumId": "2" }) ).unwrap();
        data.absorb( EntryData::from_record( &rec ) );
        assert_eq!( data.uri.as_deref(), Some( "y" ) );
        assert_eq!( data.name.as_deref(), Some( "hooked" ) );
        assert_eq!( data.extra( "AlbumId" ), Some( "1" ) );
    }


    #[test]
    fn test_identity_fallbacks() {
        let song = EntryData::from_record( &Record::try_from( json!({ "uri": "a.flac", "AlbumId": "3", "Pos": 1 }) ).unwrap() );
        assert_eq!( song.identity(), Some( Identity::Uri( "a.flac" ) ) );

        let album = EntryData::from_record( &Record::try_from( json!({ "Type": "album", "AlbumId": "3" }) ).unwrap() );
        assert_eq!( album.identity(), Some( Identity::Album { id: "3", pos: None } ) );

        let tag = EntryData::from_record( &Record::try_from( json!({ "Value": "Bebop" }) ).unwrap() );
        assert_eq!( tag.identity(), Some( Identity::Tag( "Bebop" ) ) );
        assert_eq!( tag.name.as_deref(), Some( "Bebop" ) );

        let slot = EntryData { pos: Some( 4 ), ..EntryData::default() };
        assert_eq!( slot.identity(), Some( Identity::Pos( 4 ) ) );
        assert_eq!( EntryData::default().identity(), None );
    }
}

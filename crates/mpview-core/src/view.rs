//! View identities and per-view configuration.
//!
//! Defines the browsable collections the engine knows about and the
//! persisted `{mode, fields}` record each of them carries.

use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::error::ViewError;


/// Identity of one browsable collection.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize )]
pub enum ViewId {
    Home,
    Playback,
    QueueCurrent,
    QueueLastPlayed,
    QueueJukeboxSong,
    QueueJukeboxAlbum,
    BrowseDatabaseTagList,
    BrowseDatabaseAlbumList,
    BrowseDatabaseAlbumDetail,
    BrowseDatabaseAlbumDetailInfo,
    BrowseFilesystem,
    BrowsePlaylistList,
    BrowsePlaylistDetail,
    BrowseRadioFavorites,
    BrowseRadioWebradiodb,
    BrowseRadioRadiobrowser,
    Search,
}


impl ViewId {
    /// Every view, in navigation order.
    pub const ALL: [ViewId; 17] = [
        ViewId::Home,
        ViewId::Playback,
        ViewId::QueueCurrent,
        ViewId::QueueLastPlayed,
        ViewId::QueueJukeboxSong,
        ViewId::QueueJukeboxAlbum,
        ViewId::BrowseDatabaseTagList,
        ViewId::BrowseDatabaseAlbumList,
        ViewId::BrowseDatabaseAlbumDetail,
        ViewId::BrowseDatabaseAlbumDetailInfo,
        ViewId::BrowseFilesystem,
        ViewId::BrowsePlaylistList,
        ViewId::BrowsePlaylistDetail,
        ViewId::BrowseRadioFavorites,
        ViewId::BrowseRadioWebradiodb,
        ViewId::BrowseRadioRadiobrowser,
        ViewId::Search,
    ];


    /// Returns the stable name of the view.
    pub fn name( &self ) -> &'static str {
        match self {
            ViewId::Home => "Home",
            ViewId::Playback => "Playback",
            ViewId::QueueCurrent => "QueueCurrent",
            ViewId::QueueLastPlayed => "QueueLastPlayed",
            ViewId::QueueJukeboxSong => "QueueJukeboxSong",
            ViewId::QueueJukeboxAlbum => "QueueJukeboxAlbum",
            ViewId::BrowseDatabaseTagList => "BrowseDatabaseTagList",
            ViewId::BrowseDatabaseAlbumList => "BrowseDatabaseAlbumList",
            ViewId::BrowseDatabaseAlbumDetail => "BrowseDatabaseAlbumDetail",
            ViewId::BrowseDatabaseAlbumDetailInfo => "BrowseDatabaseAlbumDetailInfo",
            ViewId::BrowseFilesystem => "BrowseFilesystem",
            ViewId::BrowsePlaylistList => "BrowsePlaylistList",
            ViewId::BrowsePlaylistDetail => "BrowsePlaylistDetail",
            ViewId::BrowseRadioFavorites => "BrowseRadioFavorites",
            ViewId::BrowseRadioWebradiodb => "BrowseRadioWebradiodb",
            ViewId::BrowseRadioRadiobrowser => "BrowseRadioRadiobrowser",
            ViewId::Search => "Search",
        }
    }


    /// Returns the id of the list element inside the view's container.
    pub fn list_id( &self ) -> String {
        format!( "{}List", self.name() )
    }


    /// Returns the next view in navigation order.
    pub fn next( self ) -> Self {
        let idx = Self::ALL.iter().position( |v| *v == self ).unwrap_or( 0 );
        Self::ALL[ ( idx + 1 ) % Self::ALL.len() ]
    }


    /// Returns the previous view in navigation order.
    pub fn prev( self ) -> Self {
        let idx = Self::ALL.iter().position( |v| *v == self ).unwrap_or( 0 );
        Self::ALL[ ( idx + Self::ALL.len() - 1 ) % Self::ALL.len() ]
    }
}


impl fmt::Display for ViewId {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        f.write_str( self.name() )
    }
}


impl FromStr for ViewId {
    type Err = ViewError;


    fn from_str( s: &str ) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find( |v| v.name().eq_ignore_ascii_case( s ) )
            .copied()
            .ok_or_else( || ViewError::UnknownView( s.to_string() ) )
    }
}


/// Structural shape a view is rendered in.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize )]
#[serde( rename_all = "lowercase" )]
pub enum ViewMode {
    /// Rows and columns with a header.
    #[default]
    Table,

    /// Cards laid out in a grid.
    Grid,

    /// Simple list-group items.
    List,
}


impl ViewMode {
    /// Returns the next mode.
    pub fn next( self ) -> Self {
        match self {
            ViewMode::Table => ViewMode::Grid,
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Table,
        }
    }


    /// Returns the name of the mode.
    pub fn name( &self ) -> &'static str {
        match self {
            ViewMode::Table => "table",
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
        }
    }
}


impl FromStr for ViewMode {
    type Err = ViewError;


    fn from_str( s: &str ) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok( ViewMode::Table ),
            "grid" => Ok( ViewMode::Grid ),
            "list" => Ok( ViewMode::List ),
            other => Err( ViewError::UnknownView( format!( "mode '{}'", other ) ) ),
        }
    }
}


/// Persisted configuration of one view.
#[derive( Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize )]
#[serde( default )]
pub struct ViewConfig {
    pub mode: ViewMode,

    /// Ordered, unique field names.
    pub fields: Vec<String>,
}


impl ViewConfig {
    /// Creates a config from a mode and field names.
    pub fn new<I, S>( mode: ViewMode, fields: I ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self { mode, fields: Vec::new() };
        for field in fields {
            config.add_field( field );
        }
        config
    }


    /// Returns true if the field is selected.
    pub fn contains( &self, field: &str ) -> bool {
        self.fields.iter().any( |f| f == field )
    }


    /// Appends a field unless already present.
    pub fn add_field( &mut self, field: impl Into<String> ) -> bool {
        let field = field.into();
        if self.contains( &field ) {
            return false;
        }
        self.fields.push( field );
        true
    }


    /// Removes a field.
    pub fn remove_field( &mut self, field: &str ) -> bool {
        if let Some( pos ) = self.fields.iter().position( |f| f == field ) {
            self.fields.remove( pos );
            true
        } else {
            false
        }
    }


    /// Moves a field one slot towards the front.
    pub fn move_field_up( &mut self, field: &str ) -> bool {
        match self.fields.iter().position( |f| f == field ) {
            Some( pos ) if pos > 0 => {
                self.fields.swap( pos, pos - 1 );
                true
            }
            _ => false,
        }
    }


    /// Moves a field one slot towards the back.
    pub fn move_field_down( &mut self, field: &str ) -> bool {
        match self.fields.iter().position( |f| f == field ) {
            Some( pos ) if pos + 1 < self.fields.len() => {
                self.fields.swap( pos, pos + 1 );
                true
            }
            _ => false,
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_view_id_round_trips_name() {
        for view in ViewId::ALL {
            assert_eq!( view.name().parse::<ViewId>().unwrap(), view );
        }
        assert!( "Nope".parse::<ViewId>().is_err() );
    }


    #[test]
    fn test_view_id_next_wraps() {
        assert_eq!( ViewId::Search.next(), ViewId::Home );
        assert_eq!( ViewId::Home.prev(), ViewId::Search );
        assert_eq!( ViewId::QueueCurrent.list_id(), "QueueCurrentList" );
    }


    #[test]
    fn test_view_mode_cycle() {
        assert_eq!( ViewMode::Table.next(), ViewMode::Grid );
        assert_eq!( ViewMode::List.next(), ViewMode::Table );
        assert_eq!( "GRID".parse::<ViewMode>().unwrap(), ViewMode::Grid );
    }


    #[test]
    fn test_config_deduplicates() {
        let config = ViewConfig::new( ViewMode::Table, [ "Title", "Artist", "Title" ] );
        assert_eq!( config.fields, vec![ "Title", "Artist" ] );
    }


    #[test]
    fn test_config_field_moves() {
        let mut config = ViewConfig::new( ViewMode::List, [ "Pos", "Title", "Duration" ] );
        assert!( config.move_field_up( "Duration" ) );
        assert_eq!( config.fields, vec![ "Pos", "Duration", "Title" ] );
        assert!( !config.move_field_up( "Pos" ) );
        assert!( config.move_field_down( "Pos" ) );
        assert_eq!( config.fields, vec![ "Duration", "Pos", "Title" ] );
        assert!( !config.move_field_down( "Title" ) );
        assert!( config.remove_field( "Pos" ) );
        assert!( !config.remove_field( "Pos" ) );
    }


    #[test]
    fn test_config_json_shape() {
        let config: ViewConfig = serde_json::from_str( r#"{"mode":"grid","fields":["Title"]}"# ).unwrap();
        assert_eq!( config.mode, ViewMode::Grid );
        assert_eq!( config.fields, vec![ "Title" ] );
    }
}

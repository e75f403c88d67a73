//! Application settings management
//!
//! Persists field registry inputs, paging behaviour and the per-view
//! `{mode, fields}` records. Every load runs the view configs through the
//! field filter so a tag disabled since the last run silently disappears.

use std::collections::BTreeMap;
use std::fs;
use std::path::{ Path, PathBuf };

use serde::{ Deserialize, Serialize };
use thiserror::Error;

use mpview_core::{ FieldRegistry, Paging, ViewConfig, ViewId, ViewMode };


/// Errors that can occur while reading or writing settings.
#[derive( Debug, Error )]
pub enum SettingsError {
    #[error( "No config directory on this platform" )]
    NoConfigDir,

    #[error( "Settings I/O failed: {0}" )]
    Io( #[from] std::io::Error ),

    #[error( "Invalid settings: {0}" )]
    Json( #[from] serde_json::Error ),
}


/// Application settings.
#[derive( Debug, Clone, Serialize, Deserialize )]
#[serde( default )]
pub struct Settings {
    /// Feature flags and tag lists the legal fields derive from.
    pub registry: FieldRegistry,

    /// Stack table fields into label/value blocks on narrow terminals.
    pub small_width_rows: bool,

    /// Each page replaces the previous one instead of appending to it.
    pub exhaustive_paging: bool,

    pub max_elements_per_page: usize,

    /// Interleave work dividers in the album detail view.
    pub show_work: bool,

    pub views: BTreeMap<ViewId, ViewConfig>,
}


impl Default for Settings {
    fn default() -> Self {
        Self {
            registry: FieldRegistry::default(),
            small_width_rows: true,
            exhaustive_paging: true,
            max_elements_per_page: 50,
            show_work: false,
            views: ViewId::ALL.iter().map( |v| ( *v, default_view_config( *v ) ) ).collect(),
        }
    }
}


impl Settings {
    /// Returns the path to the settings file.
    fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map( |p| p.join( "mpview" ).join( "settings.json" ) )
    }


    /// Loads settings from disk, or returns defaults if not found or invalid.
    pub fn load() -> Self {
        let path = match Self::settings_path() {
            Some( p ) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from( &path ) {
            Ok( settings ) => settings,
            Err( e ) => {
                tracing::warn!( "Failed to read settings from {:?}: {}", path, e );
                Self::default()
            }
        }
    }


    /// Loads settings from a file.
    pub fn load_from( path: &Path ) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string( path )?;
        Self::from_json( &contents )
    }


    /// Parses settings and filters every view config against the legal fields.
    pub fn from_json( json: &str ) -> Result<Self, SettingsError> {
        let mut settings: Settings = serde_json::from_str( json )?;
        for view in ViewId::ALL {
            settings.views.entry( view ).or_insert_with( || default_view_config( view ) );
        }
        settings.refresh();
        Ok( settings )
    }


    /// Saves settings to disk.
    pub fn save( &self ) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or( SettingsError::NoConfigDir )?;
        if let Some( parent ) = path.parent() {
            fs::create_dir_all( parent )?;
        }
        fs::write( &path, serde_json::to_string_pretty( self )? )?;
        tracing::debug!( "Saved settings to {:?}", path );
        Ok(())
    }


    /// Re-applies the field filter to every view config.
    pub fn refresh( &mut self ) {
        let registry = &self.registry;
        for ( view, config ) in self.views.iter_mut() {
            *config = registry.filter_fields( *view, config );
        }
    }


    /// Returns the config of a view.
    pub fn view_config( &self, view: ViewId ) -> ViewConfig {
        self.views
            .get( &view )
            .cloned()
            .unwrap_or_else( || self.registry.filter_fields( view, &default_view_config( view ) ) )
    }


    /// Stores the config of a view, filtered against the legal fields.
    pub fn set_view_config( &mut self, view: ViewId, config: &ViewConfig ) {
        let filtered = self.registry.filter_fields( view, config );
        self.views.insert( view, filtered );
    }


    pub fn paging( &self ) -> Paging {
        if self.exhaustive_paging { Paging::Exhaustive } else { Paging::Incremental }
    }
}


/// Returns the stock config of a view.
pub fn default_view_config( view: ViewId ) -> ViewConfig {
    let ( mode, fields ): ( ViewMode, &[&str] ) = match view {
        ViewId::Home => ( ViewMode::List, &[ "Title" ] ),
        ViewId::Playback => ( ViewMode::List, &[ "Artist", "Album", "AudioFormat" ] ),
        ViewId::QueueCurrent => ( ViewMode::Table, &[ "Pos", "Title", "Artist", "Album", "Duration" ] ),
        ViewId::QueueLastPlayed => ( ViewMode::Table, &[ "Pos", "Title", "Artist", "Album", "LastPlayed" ] ),
        ViewId::QueueJukeboxSong => ( ViewMode::Table, &[ "Pos", "Title", "Artist", "Album" ] ),
        ViewId::QueueJukeboxAlbum => ( ViewMode::Table, &[ "Pos", "Album", "AlbumArtist" ] ),
        ViewId::BrowseDatabaseTagList => ( ViewMode::List, &[ "Value" ] ),
        ViewId::BrowseDatabaseAlbumList => ( ViewMode::Grid, &[ "Thumbnail", "Album", "AlbumArtist" ] ),
        ViewId::BrowseDatabaseAlbumDetail => ( ViewMode::Table, &[ "Track", "Title", "Duration" ] ),
        ViewId::BrowseDatabaseAlbumDetailInfo => ( ViewMode::List, &[ "AlbumArtist", "Genre", "Date", "SongCount" ] ),
        ViewId::BrowseFilesystem => ( ViewMode::Table, &[ "Type", "Title", "Artist", "Album", "Duration" ] ),
        ViewId::BrowsePlaylistList => ( ViewMode::Table, &[ "Type", "Name", "Last-Modified" ] ),
        ViewId::BrowsePlaylistDetail => ( ViewMode::Table, &[ "Pos", "Title", "Artist", "Album", "Duration" ] ),
        ViewId::BrowseRadioFavorites => ( ViewMode::Grid, &[ "Thumbnail", "Name", "Genre", "Country" ] ),
        ViewId::BrowseRadioWebradiodb => ( ViewMode::Table, &[ "Name", "Country", "Languages", "Genre", "Codec", "Bitrate" ] ),
        ViewId::BrowseRadioRadiobrowser => ( ViewMode::Table, &[ "country", "language", "tags", "votes", "lastcheckok" ] ),
        ViewId::Search => ( ViewMode::Table, &[ "Title", "Artist", "Album", "Duration" ] ),
    };
    ViewConfig::new( mode, fields.iter().copied() )
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_defaults_are_legal() {
        let settings = Settings::default();
        for view in ViewId::ALL {
            let config = default_view_config( view );
            assert_eq!( settings.registry.filter_fields( view, &config ), config, "{}", view );
        }
    }


    #[test]
    fn test_load_filters_fields() {
        let json = r#"{
            "views": {
                "QueueCurrent": { "mode": "list", "fields": [ "Title", "Bogus", "stickerLike", "Pos" ] }
            }
        }"#;
        let settings = Settings::from_json( json ).unwrap();
        let config = settings.view_config( ViewId::QueueCurrent );
        assert_eq!( config.mode, ViewMode::List );
        assert_eq!( config.fields, vec![ "Title", "Pos" ] );

        // views missing from the file get their stock config
        assert_eq!( settings.view_config( ViewId::Search ), default_view_config( ViewId::Search ) );
    }


    #[test]
    fn test_stickers_become_legal_when_enabled() {
        let json = r#"{
            "registry": { "features": { "stickers": true } },
            "views": {
                "QueueCurrent": { "mode": "table", "fields": [ "Title", "stickerLike" ] }
            }
        }"#;
        let settings = Settings::from_json( json ).unwrap();
        assert_eq!( settings.view_config( ViewId::QueueCurrent ).fields, vec![ "Title", "stickerLike" ] );
    }


    #[test]
    fn test_set_view_config_filters() {
        let mut settings = Settings::default();
        let config = ViewConfig::new( ViewMode::Grid, [ "Name", "LastPlayed" ] );
        settings.set_view_config( ViewId::BrowsePlaylistList, &config );
        assert_eq!( settings.view_config( ViewId::BrowsePlaylistList ).fields, vec![ "Name" ] );
    }


    #[test]
    fn test_invalid_json_is_an_error() {
        assert!( matches!( Settings::from_json( "{ nope" ), Err( SettingsError::Json( _ ) ) ) );
    }


    #[test]
    fn test_paging_flag() {
        let mut settings = Settings::default();
        assert_eq!( settings.paging(), Paging::Exhaustive );
        settings.exhaustive_paging = false;
        assert_eq!( settings.paging(), Paging::Incremental );
    }
}

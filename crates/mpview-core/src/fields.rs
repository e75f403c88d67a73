//! Legal field computation
//!
//! Works out which fields a view may display from the server's feature flags
//! and the configured tag lists, and trims persisted field selections down to
//! that set.

use serde::{ Deserialize, Serialize };

use crate::view::{ ViewConfig, ViewId };


/// Feature flags reported by the server.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize )]
#[serde( default )]
pub struct Features {
    /// Tag support is enabled.
    pub tags: bool,

    /// The database tracks an `Added` timestamp.
    pub db_added: bool,

    /// Stickers are available.
    pub stickers: bool,

    /// Lyrics are available.
    pub lyrics: bool,
}


impl Default for Features {
    fn default() -> Self {
        Self {
            tags: true,
            db_added: false,
            stickers: false,
            lyrics: false,
        }
    }
}


/// How album views are populated.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize )]
#[serde( rename_all = "lowercase" )]
pub enum AlbumMode {
    /// Albums grouped by the server's album cache.
    #[default]
    #[serde( alias = "adv" )]
    Advanced,

    /// Albums derived from a plain tag listing.
    Simple,
}


/// Inputs to the legal-field computation.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct FieldRegistry {
    pub features: Features,

    /// Tags enabled for song views.
    pub tag_list: Vec<String>,

    /// Tags enabled for album views.
    pub tag_list_album: Vec<String>,

    /// Sticker names appended when stickers are enabled.
    pub sticker_list: Vec<String>,

    pub album_mode: AlbumMode,
}


impl Default for FieldRegistry {
    fn default() -> Self {
        Self {
            features: Features::default(),
            tag_list: to_strings( &[ "Artist", "Album", "AlbumArtist", "Title", "Track", "Disc", "Genre", "Date" ] ),
            tag_list_album: to_strings( &[ "Album", "AlbumArtist", "Date", "Genre" ] ),
            sticker_list: to_strings( &[ "stickerPlayCount", "stickerSkipCount", "stickerLastPlayed", "stickerLastSkipped", "stickerLike", "stickerElapsed" ] ),
            album_mode: AlbumMode::default(),
        }
    }
}


fn to_strings( names: &[&str] ) -> Vec<String> {
    names.iter().map( |s| s.to_string() ).collect()
}


impl FieldRegistry {
    /// Returns the ordered set of fields the view may display.
    pub fn legal_fields( &self, view: ViewId ) -> Vec<String> {
        let fields = match view {
            ViewId::BrowsePlaylistList => to_strings( &[ "Type", "Name", "Last-Modified", "Thumbnail" ] ),
            ViewId::BrowseRadioFavorites | ViewId::BrowseRadioWebradiodb => to_strings( &[
                "Country", "Description", "Genre", "Homepage", "Languages", "Name",
                "State", "StreamUri", "Codec", "Bitrate", "Thumbnail",
            ] ),
            ViewId::BrowseRadioRadiobrowser => to_strings( &[
                "clickcount", "country", "homepage", "language", "lastchangetime",
                "lastcheckok", "tags", "url_resolved", "votes",
            ] ),
            ViewId::BrowseDatabaseTagList => to_strings( &[ "Value", "Thumbnail" ] ),
            ViewId::BrowseDatabaseAlbumList => self.album_fields( &[ "Thumbnail" ], &[ "Disc" ], true ),
            ViewId::BrowseDatabaseAlbumDetailInfo => self.album_fields( &[], &[ "Disc", "Album" ], false ),
            ViewId::QueueJukeboxAlbum => {
                let mut tags = self.tag_list_album.clone();
                tags.extend( to_strings( &[ "Pos", "Discs", "SongCount", "Duration", "Last-Modified" ] ) );
                if self.features.db_added {
                    tags.push( "Added".to_string() );
                }
                tags.retain( |t| t != "Disc" );
                tags
            }
            _ => self.song_fields( view ),
        };
        dedup( fields )
    }


    /// Intersects the configured fields with the legal set.
    ///
    /// Keeps the configured order, drops fields that are no longer legal and
    /// repeated entries. Applying it twice changes nothing.
    pub fn filter_fields( &self, view: ViewId, config: &ViewConfig ) -> ViewConfig {
        let legal = self.legal_fields( view );
        let mut filtered = ViewConfig { mode: config.mode, fields: Vec::with_capacity( config.fields.len() ) };

        for field in &config.fields {
            if legal.contains( field ) {
                filtered.add_field( field.clone() );
            } else {
                tracing::debug!( "Dropping field {} from {}", field, view );
            }
        }

        tracing::debug!( "Columns for {}: {:?}", view, filtered.fields );
        filtered
    }


    /// Returns the legal fields that are not selected in `config`.
    pub fn available_fields( &self, view: ViewId, config: &ViewConfig ) -> Vec<String> {
        self.legal_fields( view )
            .into_iter()
            .filter( |f| !config.contains( f ) )
            .collect()
    }


    /// Album list and album info fields.
    fn album_fields( &self, simple_extra: &[&str], remove: &[&str], with_thumbnail: bool ) -> Vec<String> {
        let mut tags = self.tag_list_album.clone();
        match self.album_mode {
            AlbumMode::Advanced => {
                tags.extend( to_strings( &[ "Discs", "SongCount", "Duration", "Last-Modified" ] ) );
                if with_thumbnail {
                    tags.push( "Thumbnail".to_string() );
                }
                if self.features.db_added {
                    tags.push( "Added".to_string() );
                }
                tags.retain( |t| !remove.contains( &t.as_str() ) );
            }
            AlbumMode::Simple => {
                tags.extend( to_strings( simple_extra ) );
            }
        }
        tags
    }


    /// Fields of every view that lists songs.
    fn song_fields( &self, view: ViewId ) -> Vec<String> {
        let mut tags = self.tag_list.clone();
        if !self.features.tags {
            tags.push( "Title".to_string() );
        }
        tags.extend( to_strings( &[ "Duration", "Last-Modified", "Filetype" ] ) );
        if view != ViewId::Playback {
            tags.push( "Thumbnail".to_string() );
        }
        if self.features.db_added {
            tags.push( "Added".to_string() );
        }

        match view {
            ViewId::QueueCurrent => {
                tags.extend( to_strings( &[ "AudioFormat", "Priority", "Pos" ] ) );
            }
            ViewId::BrowsePlaylistDetail | ViewId::QueueJukeboxSong => {
                tags.push( "Pos".to_string() );
            }
            ViewId::BrowseFilesystem => {
                tags.extend( to_strings( &[ "Type", "Filename" ] ) );
            }
            ViewId::Playback => {
                tags.push( "AudioFormat".to_string() );
                if self.features.lyrics {
                    tags.push( "Lyrics".to_string() );
                }
            }
            ViewId::QueueLastPlayed => {
                tags.extend( to_strings( &[ "Pos", "LastPlayed" ] ) );
            }
            _ => {}
        }

        tags.sort();
        if self.features.stickers {
            tags.extend( self.sticker_list.iter().cloned() );
        }
        tags
    }
}


/// Removes repeated names, keeping the first occurrence.
fn dedup( fields: Vec<String> ) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity( fields.len() );
    for field in fields {
        if !out.contains( &field ) {
            out.push( field );
        }
    }
    out
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::view::ViewMode;


    #[test]
    fn test_queue_current_fields() {
        let registry = FieldRegistry::default();
        let fields = registry.legal_fields( ViewId::QueueCurrent );
        for expected in [ "AudioFormat", "Priority", "Pos", "Thumbnail", "Duration", "Title" ] {
            assert!( fields.contains( &expected.to_string() ), "missing {}", expected );
        }
        assert!( !fields.contains( &"stickerLike".to_string() ) );

        let mut sorted = fields.clone();
        sorted.sort();
        assert_eq!( fields, sorted );
    }


    #[test]
    fn test_playback_has_no_thumbnail() {
        let mut registry = FieldRegistry::default();
        registry.features.lyrics = true;
        let fields = registry.legal_fields( ViewId::Playback );
        assert!( !fields.contains( &"Thumbnail".to_string() ) );
        assert!( fields.contains( &"Lyrics".to_string() ) );
        assert!( fields.contains( &"AudioFormat".to_string() ) );
    }


    #[test]
    fn test_stickers_appended_after_sort() {
        let mut registry = FieldRegistry::default();
        registry.features.stickers = true;
        let fields = registry.legal_fields( ViewId::Search );
        let last = fields.last().unwrap();
        assert_eq!( last, "stickerElapsed" );
        let first_sticker = fields.iter().position( |f| f.starts_with( "sticker" ) ).unwrap();
        assert!( fields[ ..first_sticker ].windows( 2 ).all( |w| w[ 0 ] <= w[ 1 ] ) );
    }


    #[test]
    fn test_title_added_without_tags_feature() {
        let mut registry = FieldRegistry::default();
        registry.tag_list = vec![ "Artist".to_string() ];
        registry.features.tags = false;
        assert!( registry.legal_fields( ViewId::Search ).contains( &"Title".to_string() ) );
    }


    #[test]
    fn test_album_list_modes() {
        let mut registry = FieldRegistry::default();
        registry.tag_list_album.push( "Disc".to_string() );
        registry.features.db_added = true;

        let adv = registry.legal_fields( ViewId::BrowseDatabaseAlbumList );
        assert!( adv.contains( &"SongCount".to_string() ) );
        assert!( adv.contains( &"Added".to_string() ) );
        assert!( !adv.contains( &"Disc".to_string() ) );

        registry.album_mode = AlbumMode::Simple;
        let simple = registry.legal_fields( ViewId::BrowseDatabaseAlbumList );
        assert!( simple.contains( &"Thumbnail".to_string() ) );
        assert!( !simple.contains( &"SongCount".to_string() ) );

        let info = registry.legal_fields( ViewId::BrowseDatabaseAlbumDetailInfo );
        assert_eq!( info, registry.tag_list_album );
    }


    #[test]
    fn test_album_info_drops_album() {
        let registry = FieldRegistry::default();
        let info = registry.legal_fields( ViewId::BrowseDatabaseAlbumDetailInfo );
        assert!( !info.contains( &"Album".to_string() ) );
        assert!( !info.contains( &"Thumbnail".to_string() ) );
    }


    #[test]
    fn test_legal_fields_stable() {
        let registry = FieldRegistry::default();
        for view in ViewId::ALL {
            assert_eq!( registry.legal_fields( view ), registry.legal_fields( view ) );
        }
    }


    #[test]
    fn test_filter_fields_closure_and_order() {
        let registry = FieldRegistry::default();
        let config = ViewConfig {
            mode: ViewMode::Grid,
            fields: vec![
                "Pos".to_string(),
                "Bogus".to_string(),
                "Title".to_string(),
                "Pos".to_string(),
                "Duration".to_string(),
            ],
        };
        let filtered = registry.filter_fields( ViewId::QueueCurrent, &config );
        assert_eq!( filtered.mode, ViewMode::Grid );
        assert_eq!( filtered.fields, vec![ "Pos", "Title", "Duration" ] );

        let legal = registry.legal_fields( ViewId::QueueCurrent );
        for view in ViewId::ALL {
            let filtered = registry.filter_fields( view, &config );
            let legal = registry.legal_fields( view );
            assert!( filtered.fields.iter().all( |f| legal.contains( f ) ) );
        }
        assert!( filtered.fields.iter().all( |f| legal.contains( f ) ) );
    }


    #[test]
    fn test_filter_fields_idempotent() {
        let registry = FieldRegistry::default();
        let config = ViewConfig::new( ViewMode::Table, [ "Artist", "stickerLike", "Priority", "Title" ] );
        let once = registry.filter_fields( ViewId::BrowsePlaylistDetail, &config );
        let twice = registry.filter_fields( ViewId::BrowsePlaylistDetail, &once );
        assert_eq!( once, twice );
        assert_eq!( once.fields, vec![ "Artist", "Title" ] );
    }


    #[test]
    fn test_disabled_tag_is_dropped() {
        let mut registry = FieldRegistry::default();
        let config = ViewConfig::new( ViewMode::Table, [ "Genre", "Title" ] );
        registry.tag_list.retain( |t| t != "Genre" );
        let filtered = registry.filter_fields( ViewId::Search, &config );
        assert_eq!( filtered.fields, vec![ "Title" ] );
    }


    #[test]
    fn test_available_fields_excludes_selected() {
        let registry = FieldRegistry::default();
        let config = ViewConfig::new( ViewMode::Table, [ "Type", "Name" ] );
        let available = registry.available_fields( ViewId::BrowsePlaylistList, &config );
        assert_eq!( available, vec![ "Last-Modified", "Thumbnail" ] );
    }
}

//! Per-field value formatting
//!
//! Turns one (field, raw value, record) triple into a renderable `Fragment`.
//! Formatting never fails: a value of the wrong shape degrades to an empty
//! fragment so one bad field cannot blank a whole row.

use std::fmt;
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use serde_json::Value;

use crate::page::{ EntryType, Record };


/// Field that renders a literal "no" instead of an empty fragment.
pub const SENTINEL_FIELD: &str = "Lyrics";

/// Text shown for the sentinel field when it has no value.
pub const SENTINEL_TEXT: &str = "no";

/// Multi-valued tags printed one value per line.
const LIST_TAGS: &[&str] = &[
    "Artist", "ArtistSort", "AlbumArtist", "AlbumArtistSort",
    "Composer", "ComposerSort", "Performer", "Conductor", "Ensemble",
    "MUSICBRAINZ_ARTISTID", "MUSICBRAINZ_ALBUMARTISTID",
];

/// Multi-valued tags printed comma separated.
const SUMMARY_TAGS: &[&str] = &[ "Genre", "Languages", "Country" ];

/// Numeric timestamp fields; zero means the event never happened.
const TIMESTAMP_FIELDS: &[&str] = &[
    "Last-Modified", "LastModified", "LastPlayed", "Added",
    "stickerLastPlayed", "stickerLastSkipped", "lastchangetime",
];

static TAG_COMMA: LazyLock<Regex> = LazyLock::new( || {
    Regex::new( r",(\S)" ).expect( "static regex" )
});


/// Material icon used inside a fragment.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum Icon {
    MusicNote,
    QueueMusic,
    List,
    FolderOpen,
    Stream,
    Radio,
    Album,
    Unknown,
    ThumbDown,
    Neutral,
    ThumbUp,
    CheckCircle,
    Error,
}


impl Icon {
    /// Returns the ligature name of the icon.
    pub fn ligature( &self ) -> &'static str {
        match self {
            Icon::MusicNote => "music_note",
            Icon::QueueMusic => "queue_music",
            Icon::List => "list",
            Icon::FolderOpen => "folder_open",
            Icon::Stream => "stream",
            Icon::Radio => "radio",
            Icon::Album => "album",
            Icon::Unknown => "radio_button_unchecked",
            Icon::ThumbDown => "thumb_down",
            Icon::Neutral => "radio_button_unchecked",
            Icon::ThumbUp => "thumb_up",
            Icon::CheckCircle => "check_circle",
            Icon::Error => "error",
        }
    }


    /// Returns a single-cell glyph for terminal output.
    pub fn glyph( &self ) -> &'static str {
        match self {
            Icon::MusicNote => "♪",
            Icon::QueueMusic => "≋",
            Icon::List => "≡",
            Icon::FolderOpen => "▸",
            Icon::Stream => "~",
            Icon::Radio => "◉",
            Icon::Album => "◎",
            Icon::Unknown | Icon::Neutral => "○",
            Icon::ThumbDown => "▼",
            Icon::ThumbUp => "▲",
            Icon::CheckCircle => "✓",
            Icon::Error => "✗",
        }
    }


    /// Returns the friendly title of an entry-type icon.
    pub fn title( &self ) -> &'static str {
        match self {
            Icon::QueueMusic => "Smart playlist",
            Icon::List => "Playlist",
            Icon::FolderOpen => "Folder",
            Icon::MusicNote => "Song",
            Icon::Stream => "Stream",
            Icon::Radio => "Webradio",
            Icon::Album => "Album",
            other => other.ligature(),
        }
    }


    /// Returns the icon for an entry type.
    pub fn for_type( entry_type: Option<EntryType> ) -> Self {
        match entry_type {
            Some( EntryType::Song ) => Icon::MusicNote,
            Some( EntryType::Smartpls ) => Icon::QueueMusic,
            Some( EntryType::Plist ) => Icon::List,
            Some( EntryType::Dir ) => Icon::FolderOpen,
            Some( EntryType::Stream ) => Icon::Stream,
            Some( EntryType::Webradio ) => Icon::Radio,
            Some( EntryType::Album ) | Some( EntryType::Disc ) => Icon::Album,
            Some( EntryType::Work ) => Icon::MusicNote,
            None => Icon::Unknown,
        }
    }
}


/// A rendered value.
#[derive( Debug, Clone, PartialEq )]
pub enum Fragment {
    Empty,
    Text( String ),
    Icon( Icon ),
    Link { href: String, text: String },
    Image( String ),
    /// One visual line per entry.
    Lines( Vec<Fragment> ),
}


impl Fragment {
    /// Creates a text fragment.
    pub fn text_of( s: impl Into<String> ) -> Self {
        Fragment::Text( s.into() )
    }


    /// Returns true for the empty fragment.
    pub fn is_empty( &self ) -> bool {
        matches!( self, Fragment::Empty )
    }


    /// Returns the plain-text projection of the fragment.
    pub fn text( &self ) -> String {
        match self {
            Fragment::Empty => String::new(),
            Fragment::Text( s ) => s.clone(),
            Fragment::Icon( icon ) => icon.ligature().to_string(),
            Fragment::Link { text, .. } => text.clone(),
            Fragment::Image( _ ) => String::new(),
            Fragment::Lines( lines ) => lines
                .iter()
                .map( Fragment::text )
                .collect::<Vec<_>>()
                .join( "\n" ),
        }
    }
}


impl fmt::Display for Fragment {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        match self {
            Fragment::Empty => Ok(()),
            Fragment::Text( s ) => f.write_str( s ),
            Fragment::Icon( icon ) => write!( f, "[{}]", icon.ligature() ),
            Fragment::Link { href, text } => write!( f, "{} <{}>", text, href ),
            Fragment::Image( uri ) => write!( f, "img({})", uri ),
            Fragment::Lines( lines ) => {
                for ( i, line ) in lines.iter().enumerate() {
                    if i > 0 {
                        f.write_str( " / " )?;
                    }
                    write!( f, "{}", line )?;
                }
                Ok(())
            }
        }
    }
}


/// Formats the value of `field` taken from `record`.
pub fn format_field( field: &str, record: &Record ) -> Fragment {
    format_value( field, record.get( field ), record )
}


/// Formats one raw value.
///
/// @param field - Field name, selects the formatting rule
/// @param value - Raw value, `None` when the record lacks the field
/// @param record - The full record, for rules that look at neighbours
///
/// @returns The rendered fragment; never fails
pub fn format_value( field: &str, value: Option<&Value>, record: &Record ) -> Fragment {
    let value = match value {
        Some( v ) if !is_empty_value( v ) => v,
        _ => {
            return if field == SENTINEL_FIELD {
                Fragment::text_of( SENTINEL_TEXT )
            } else {
                Fragment::Empty
            };
        }
    };

    let fragment = match field {
        "Type" => value.as_str()
            .map( |t| Fragment::Icon( Icon::for_type( EntryType::from_name( t ) ) ) ),
        "Duration" | "stickerElapsed" => as_seconds( value ).map( |s| Fragment::Text( format_duration( s ) ) ),
        "AudioFormat" => format_audio_format( value ),
        "Pos" => value.as_u64().and_then( |p| p.checked_add( 1 ) ).map( |p| Fragment::Text( p.to_string() ) ),
        "stickerLike" => value.as_u64().map( |v| Fragment::Icon( match v {
            0 => Icon::ThumbDown,
            1 => Icon::Neutral,
            _ => Icon::ThumbUp,
        } ) ),
        "tags" => value.as_str()
            .map( |s| Fragment::Text( TAG_COMMA.replace_all( s, ", $1" ).into_owned() ) ),
        "homepage" | "Homepage" => value.as_str().map( |s| Fragment::Link {
            href: s.to_string(),
            text: s.to_string(),
        } ),
        "lastcheckok" => value.as_u64().map( |v| Fragment::Icon( if v == 1 { Icon::CheckCircle } else { Icon::Error } ) ),
        "Bitrate" => value.as_u64().map( |v| Fragment::Text( format!( "{} kbit", v ) ) ),
        "SongCount" => value.as_u64().map( |v| Fragment::Text( plural( v, "song", "songs" ) ) ),
        "Discs" => value.as_u64().map( |v| Fragment::Text( plural( v, "disc", "discs" ) ) ),
        "Thumbnail" => value.as_str().map( |s| Fragment::Image( s.to_string() ) ),
        f if TIMESTAMP_FIELDS.contains( &f ) => as_seconds( value ).map( |s| Fragment::Text( format_timestamp( s ) ) ),
        f if LIST_TAGS.contains( &f ) => format_list_tag( f, value ),
        f if SUMMARY_TAGS.contains( &f ) => format_summary( value ),
        f if f.starts_with( "MUSICBRAINZ" ) => value.as_str().map( |s| musicbrainz_link( f, s ) ),
        _ => Some( literal( value ) ),
    };

    fragment.unwrap_or_else( || {
        tracing::debug!( "Unexpected value for {} in {:?}: {}", field, record.uri(), value );
        Fragment::Empty
    })
}


/// Formats seconds as `H:MM:SS`, or `M:SS` below one hour.
pub fn format_duration( secs: u64 ) -> String {
    let hours = secs / 3600;
    let minutes = ( secs % 3600 ) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!( "{}:{:02}:{:02}", hours, minutes, seconds )
    } else {
        format!( "{}:{:02}", minutes, seconds )
    }
}


/// Formats a unix timestamp; zero prints `never`.
pub fn format_timestamp( secs: u64 ) -> String {
    if secs == 0 {
        return "never".to_string();
    }
    match i64::try_from( secs ).ok().and_then( |s| DateTime::from_timestamp( s, 0 ) ) {
        Some( dt ) => dt.format( "%Y-%m-%d %H:%M" ).to_string(),
        None => secs.to_string(),
    }
}


/// Returns the bit depth label.
pub fn format_bits( bits: u64 ) -> String {
    match bits {
        224 => "32 bit floating".to_string(),
        225 => "DSD".to_string(),
        b => format!( "{} bit", b ),
    }
}


/// Returns the channel word.
pub fn channel_word( channels: u64 ) -> String {
    match channels {
        1 => "mono".to_string(),
        2 => "stereo".to_string(),
        n => format!( "{} channels", n ),
    }
}


/// Derives the cover image uri from the record type.
pub fn thumbnail_uri( record: &Record ) -> Option<String> {
    match record.entry_type()? {
        EntryType::Album => {
            match record.str( "FirstSongUri" ) {
                Some( first ) if first != "albumid" => {
                    Some( format!( "/albumart-thumb?offset=0&uri={}", encode( first ) ) )
                }
                _ => record.str( "AlbumId" ).map( |id| format!( "/albumart-thumb/{}", id ) ),
            }
        }
        EntryType::Song | EntryType::Stream | EntryType::Webradio => {
            record.uri().map( |uri| format!( "/albumart?offset=0&uri={}", encode( uri ) ) )
        }
        EntryType::Dir => record.uri().map( |uri| format!( "/folderart?path={}", encode( uri ) ) ),
        EntryType::Plist | EntryType::Smartpls => {
            record.uri().map( |uri| format!( "/playlistart?playlist={}", encode( uri ) ) )
        }
        EntryType::Disc | EntryType::Work => None,
    }
}


/// Returns the upper-cased file extension of a uri.
pub fn filetype( uri: &str ) -> Option<String> {
    if uri.contains( "://" ) {
        return Some( "Stream".to_string() );
    }
    let name = uri.rsplit( '/' ).next()?;
    let ( stem, ext ) = name.rsplit_once( '.' )?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some( ext.to_uppercase() )
}


/// Fills in derived fields the renderer expects.
///
/// `Title` falls back to `name`, `Filetype` comes from the uri extension and
/// `Thumbnail` from the entry type. Existing values are left alone.
pub fn complete_record( record: &Record ) -> Record {
    let mut out = record.clone();
    if out.get( "Title" ).is_none() {
        if let Some( name ) = record.str( "name" ) {
            out.insert( "Title", Value::String( name.to_string() ) );
        }
    }
    if out.get( "Filetype" ).is_none() {
        if let Some( ft ) = record.uri().and_then( filetype ) {
            out.insert( "Filetype", Value::String( ft ) );
        }
    }
    if out.get( "Thumbnail" ).is_none() {
        if let Some( uri ) = thumbnail_uri( record ) {
            out.insert( "Thumbnail", Value::String( uri ) );
        }
    }
    out
}


fn encode( s: &str ) -> String {
    url::form_urlencoded::byte_serialize( s.as_bytes() ).collect()
}


fn is_empty_value( value: &Value ) -> bool {
    match value {
        Value::Null => true,
        Value::String( s ) => s.is_empty(),
        Value::Array( a ) => a.is_empty(),
        _ => false,
    }
}


fn as_seconds( value: &Value ) -> Option<u64> {
    match value {
        Value::Number( n ) => n.as_u64().or_else( || {
            n.as_f64().filter( |f| *f >= 0.0 ).map( |f| f.floor() as u64 )
        }),
        _ => None,
    }
}


fn plural( n: u64, one: &str, many: &str ) -> String {
    if n == 1 {
        format!( "{} {}", n, one )
    } else {
        format!( "{} {}", n, many )
    }
}


fn format_audio_format( value: &Value ) -> Option<Fragment> {
    let bits = value.get( "bits" )?.as_u64()?;
    let rate = value.get( "sampleRate" )?.as_u64()?;
    let channels = value.get( "channels" )?.as_u64()?;
    Some( Fragment::Text( format!(
        "{} – {}kHz – {}",
        format_bits( bits ),
        rate as f64 / 1000.0,
        channel_word( channels ),
    ) ) )
}


fn format_list_tag( field: &str, value: &Value ) -> Option<Fragment> {
    let values: Vec<&str> = match value {
        Value::String( s ) => vec![ s.as_str() ],
        Value::Array( items ) => items.iter().filter_map( Value::as_str ).collect(),
        _ => return None,
    };
    if values.is_empty() {
        return None;
    }

    let lines = values
        .into_iter()
        .map( |v| if field.starts_with( "MUSICBRAINZ" ) {
            musicbrainz_link( field, v )
        } else {
            Fragment::text_of( v )
        })
        .collect();
    Some( Fragment::Lines( lines ) )
}


fn format_summary( value: &Value ) -> Option<Fragment> {
    match value {
        Value::String( s ) => Some( Fragment::text_of( s.as_str() ) ),
        Value::Array( items ) => {
            let joined = items.iter().map( literal_text ).collect::<Vec<_>>().join( ", " );
            Some( Fragment::Text( joined ) )
        }
        _ => None,
    }
}


fn musicbrainz_link( field: &str, value: &str ) -> Fragment {
    let entity = match field {
        "MUSICBRAINZ_ALBUMARTISTID" | "MUSICBRAINZ_ARTISTID" => "artist",
        "MUSICBRAINZ_ALBUMID" => "release",
        "MUSICBRAINZ_RELEASETRACKID" => "track",
        "MUSICBRAINZ_TRACKID" => "recording",
        _ => "",
    };
    if entity.is_empty() || value == "-" {
        return Fragment::text_of( value );
    }
    Fragment::Link {
        href: format!( "https://musicbrainz.org/{}/{}", entity, value ),
        text: value.to_string(),
    }
}


fn literal( value: &Value ) -> Fragment {
    match value {
        Value::Array( items ) => Fragment::Text(
            items.iter().map( literal_text ).collect::<Vec<_>>().join( ", " )
        ),
        other => Fragment::Text( literal_text( other ) ),
    }
}


fn literal_text( value: &Value ) -> String {
    match value {
        Value::String( s ) => s.clone(),
        other => other.to_string(),
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use serde_json::json;


    fn record( value: Value ) -> Record {
        Record::try_from( value ).unwrap()
    }


    #[test]
    fn test_duration() {
        assert_eq!( format_duration( 59 ), "0:59" );
        assert_eq!( format_duration( 185 ), "3:05" );
        assert_eq!( format_duration( 3725 ), "1:02:05" );

        let rec = record( json!({ "Duration": 245.7 }) );
        assert_eq!( format_field( "Duration", &rec ), Fragment::text_of( "4:05" ) );
    }


    #[test]
    fn test_empty_and_sentinel() {
        let rec = record( json!({ "Title": "", "Album": null }) );
        assert_eq!( format_field( "Title", &rec ), Fragment::Empty );
        assert_eq!( format_field( "Album", &rec ), Fragment::Empty );
        assert_eq!( format_field( "Missing", &rec ), Fragment::Empty );
        assert_eq!( format_field( SENTINEL_FIELD, &rec ), Fragment::text_of( "no" ) );
    }


    #[test]
    fn test_timestamp_never() {
        let rec = record( json!({ "LastPlayed": 0, "Last-Modified": 1_700_000_000 }) );
        assert_eq!( format_field( "LastPlayed", &rec ), Fragment::text_of( "never" ) );
        assert_eq!( format_field( "Last-Modified", &rec ), Fragment::text_of( "2023-11-14 22:13" ) );
    }


    #[test]
    fn test_list_tags_one_line_per_value() {
        let rec = record( json!({ "Artist": [ "Alpha", "Beta" ] }) );
        let frag = format_field( "Artist", &rec );
        assert_eq!( frag, Fragment::Lines( vec![ Fragment::text_of( "Alpha" ), Fragment::text_of( "Beta" ) ] ) );
        assert_eq!( frag.text(), "Alpha\nBeta" );
    }


    #[test]
    fn test_musicbrainz_artist_links() {
        let rec = record( json!({ "MUSICBRAINZ_ARTISTID": [ "abc", "-" ] }) );
        match format_field( "MUSICBRAINZ_ARTISTID", &rec ) {
            Fragment::Lines( lines ) => {
                assert_eq!( lines[ 0 ], Fragment::Link {
                    href: "https://musicbrainz.org/artist/abc".to_string(),
                    text: "abc".to_string(),
                } );
                assert_eq!( lines[ 1 ], Fragment::text_of( "-" ) );
            }
            other => panic!( "unexpected fragment {:?}", other ),
        }
    }


    #[test]
    fn test_summary_tags_comma_joined() {
        let rec = record( json!({ "Genre": [ "Rock", "Pop" ], "Country": "DE" }) );
        assert_eq!( format_field( "Genre", &rec ), Fragment::text_of( "Rock, Pop" ) );
        assert_eq!( format_field( "Country", &rec ), Fragment::text_of( "DE" ) );
    }


    #[test]
    fn test_audio_format() {
        let rec = record( json!({ "AudioFormat": { "bits": 16, "sampleRate": 44100, "channels": 2 } }) );
        assert_eq!( format_field( "AudioFormat", &rec ), Fragment::text_of( "16 bit – 44.1kHz – stereo" ) );

        let dsd = record( json!({ "AudioFormat": { "bits": 225, "sampleRate": 48000, "channels": 6 } }) );
        assert_eq!( format_field( "AudioFormat", &dsd ), Fragment::text_of( "DSD – 48kHz – 6 channels" ) );
    }


    #[test]
    fn test_like_tristate() {
        let icons: Vec<Fragment> = [ 0, 1, 2 ]
            .iter()
            .map( |v| format_field( "stickerLike", &record( json!({ "stickerLike": v }) ) ) )
            .collect();
        assert_eq!( icons, vec![
            Fragment::Icon( Icon::ThumbDown ),
            Fragment::Icon( Icon::Neutral ),
            Fragment::Icon( Icon::ThumbUp ),
        ] );
    }


    #[test]
    fn test_pos_is_one_indexed() {
        let rec = record( json!({ "Pos": 0 }) );
        assert_eq!( format_field( "Pos", &rec ), Fragment::text_of( "1" ) );
    }


    #[test]
    fn test_pos_at_u64_max_is_empty() {
        let rec = record( json!({ "Pos": u64::MAX }) );
        assert_eq!( format_field( "Pos", &rec ), Fragment::Empty );
        let below = record( json!({ "Pos": u64::MAX - 1 }) );
        assert_eq!( format_field( "Pos", &below ), Fragment::Text( u64::MAX.to_string() ) );
    }


    #[test]
    fn test_type_titles() {
        assert_eq!( Icon::for_type( Some( EntryType::Smartpls ) ).title(), "Smart playlist" );
        assert_eq!( Icon::for_type( Some( EntryType::Album ) ).title(), "Album" );
        assert_eq!( Icon::ThumbUp.title(), "thumb_up" );
    }


    #[test]
    fn test_malformed_value_degrades() {
        let rec = record( json!({ "Duration": "long", "AudioFormat": { "bits": 16 }, "Pos": -3 }) );
        assert_eq!( format_field( "Duration", &rec ), Fragment::Empty );
        assert_eq!( format_field( "AudioFormat", &rec ), Fragment::Empty );
        assert_eq!( format_field( "Pos", &rec ), Fragment::Empty );
    }


    #[test]
    fn test_unknown_field_literal() {
        let rec = record( json!({ "Priority": 5, "Comment": "hi", "votes": 12 }) );
        assert_eq!( format_field( "Priority", &rec ), Fragment::text_of( "5" ) );
        assert_eq!( format_field( "Comment", &rec ), Fragment::text_of( "hi" ) );
        assert_eq!( format_field( "votes", &rec ), Fragment::text_of( "12" ) );
    }


    #[test]
    fn test_radiobrowser_fields() {
        let rec = record( json!({ "tags": "jazz,blues,  soul", "lastcheckok": 1, "homepage": "https://example.org" }) );
        assert_eq!( format_field( "tags", &rec ), Fragment::text_of( "jazz, blues,  soul" ) );
        assert_eq!( format_field( "lastcheckok", &rec ), Fragment::Icon( Icon::CheckCircle ) );
        assert!( matches!( format_field( "homepage", &rec ), Fragment::Link { .. } ) );
    }


    #[test]
    fn test_counts() {
        let rec = record( json!({ "SongCount": 1, "Discs": 2, "Bitrate": 320 }) );
        assert_eq!( format_field( "SongCount", &rec ), Fragment::text_of( "1 song" ) );
        assert_eq!( format_field( "Discs", &rec ), Fragment::text_of( "2 discs" ) );
        assert_eq!( format_field( "Bitrate", &rec ), Fragment::text_of( "320 kbit" ) );
    }


    #[test]
    fn test_type_icon() {
        let rec = record( json!({ "Type": "dir" }) );
        assert_eq!( format_field( "Type", &rec ), Fragment::Icon( Icon::FolderOpen ) );
        let odd = record( json!({ "Type": "mystery" }) );
        assert_eq!( format_field( "Type", &odd ), Fragment::Icon( Icon::Unknown ) );
    }


    #[test]
    fn test_complete_record() {
        let rec = record( json!({ "Type": "dir", "uri": "Music/Jazz", "name": "Jazz" }) );
        let done = complete_record( &rec );
        assert_eq!( done.str( "Title" ), Some( "Jazz" ) );
        assert_eq!( done.str( "Thumbnail" ), Some( "/folderart?path=Music%2FJazz" ) );
        assert!( done.get( "Filetype" ).is_none() );

        let song = complete_record( &record( json!({ "Type": "song", "uri": "a/b.flac" }) ) );
        assert_eq!( song.str( "Filetype" ), Some( "FLAC" ) );
    }


    #[test]
    fn test_album_thumbnail_by_id() {
        let rec = record( json!({ "Type": "album", "FirstSongUri": "albumid", "AlbumId": "42" }) );
        assert_eq!( thumbnail_uri( &rec ).as_deref(), Some( "/albumart-thumb/42" ) );
    }
}

//! Page fixtures served from disk.
//!
//! Stands in for the server: each view's full listing is read once from
//! `<dir>/<View>.json` (or one entry of a single JSON file keyed by view
//! name) and cut into windows on request. Reorders and removals are applied
//! to the in-memory copy, so a refresh after a drop shows the new order.

use std::collections::HashMap;
use std::fs;
use std::path::{ Path, PathBuf };

use serde_json::Value;
use thiserror::Error;

use mpview_core::{ paginate_window, PageResult, Record, Response, ViewId };


/// Errors raised while loading fixtures.
#[derive( Debug, Error )]
pub enum TransportError {
    #[error( "Failed to read {path:?}: {source}" )]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error( "Invalid page JSON in {path:?}: {source}" )]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error( "No fixture for view {0}" )]
    NotFound( ViewId ),

    #[error( "Position {pos} out of range for {view}" )]
    OutOfRange { view: ViewId, pos: usize },
}


/// Fixture-backed transport.
#[derive( Debug )]
pub struct FileTransport {
    root: PathBuf,
    cache: HashMap<ViewId, Response>,
}


impl FileTransport {
    /// Creates a transport reading from a directory or a single file.
    pub fn new( root: impl Into<PathBuf> ) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }


    /// Fetches one window of a view.
    ///
    /// Errors stored in a fixture are passed through as error responses.
    pub fn fetch( &mut self, view: ViewId, offset: usize, limit: usize ) -> Result<Response, TransportError> {
        let full = self.listing( view )?;
        let Some( page ) = full.result.clone() else {
            return Ok( full.clone() );
        };

        let total = page.data.len() as i64;
        let mut window = match view {
            // the radio database view pages on the client
            ViewId::BrowseRadioWebradiodb => paginate_window( page, offset, limit ),
            _ => {
                let data: Vec<Record> = page.data.iter().skip( offset ).take( limit ).cloned().collect();
                PageResult { offset, limit, returned_entities: data.len(), data, ..page }
            }
        };
        window.total_entities = total;
        tracing::debug!( "Fetched {} offset={} limit={} returned={}", view, offset, limit, window.returned_entities );
        Ok( Response::ok( window ) )
    }


    /// Moves an entry of a view's listing and renumbers `Pos`.
    pub fn move_entry( &mut self, view: ViewId, from: usize, to: usize ) -> Result<(), TransportError> {
        let data = self.data_mut( view )?;
        if from >= data.len() {
            return Err( TransportError::OutOfRange { view, pos: from } );
        }
        if to >= data.len() {
            return Err( TransportError::OutOfRange { view, pos: to } );
        }
        let entry = data.remove( from );
        data.insert( to, entry );
        renumber( data );
        tracing::info!( "Moved {} entry {} to {}", view, from, to );
        Ok(())
    }


    /// Removes an entry of a view's listing and renumbers `Pos`.
    pub fn remove_entry( &mut self, view: ViewId, pos: usize ) -> Result<(), TransportError> {
        let data = self.data_mut( view )?;
        if pos >= data.len() {
            return Err( TransportError::OutOfRange { view, pos } );
        }
        data.remove( pos );
        renumber( data );
        Ok(())
    }


    /// Forgets cached listings so the next fetch re-reads the fixtures.
    pub fn reload( &mut self ) {
        self.cache.clear();
    }


    fn data_mut( &mut self, view: ViewId ) -> Result<&mut Vec<Record>, TransportError> {
        self.listing( view )?;
        self.cache
            .get_mut( &view )
            .and_then( |r| r.result.as_mut() )
            .map( |p| &mut p.data )
            .ok_or( TransportError::NotFound( view ) )
    }


    fn listing( &mut self, view: ViewId ) -> Result<&Response, TransportError> {
        if !self.cache.contains_key( &view ) {
            let response = self.read_fixture( view )?;
            self.cache.insert( view, response );
        }
        self.cache.get( &view ).ok_or( TransportError::NotFound( view ) )
    }


    fn read_fixture( &self, view: ViewId ) -> Result<Response, TransportError> {
        if self.root.is_dir() {
            let path = self.root.join( format!( "{}.json", view.name() ) );
            if !path.exists() {
                return Err( TransportError::NotFound( view ) );
            }
            let value = read_json( &path )?;
            return parse_fixture( value, &path );
        }

        let mut value = read_json( &self.root )?;
        match value.get_mut( view.name() ).map( Value::take ) {
            Some( entry ) => parse_fixture( entry, &self.root ),
            None => Err( TransportError::NotFound( view ) ),
        }
    }
}


fn read_json( path: &Path ) -> Result<Value, TransportError> {
    let contents = fs::read_to_string( path ).map_err( |source| TransportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str( &contents ).map_err( |source| TransportError::Json {
        path: path.to_path_buf(),
        source,
    })
}


/// Accepts either a full response (`result` / `error`) or a bare page.
fn parse_fixture( value: Value, path: &Path ) -> Result<Response, TransportError> {
    let wrapped = value.get( "result" ).is_some() || value.get( "error" ).is_some();
    let parsed = if wrapped {
        serde_json::from_value::<Response>( value )
    } else {
        serde_json::from_value::<PageResult>( value ).map( Response::ok )
    };
    parsed.map_err( |source| TransportError::Json { path: path.to_path_buf(), source } )
}


fn renumber( data: &mut [Record] ) {
    for ( i, record ) in data.iter_mut().enumerate() {
        if record.get( "Pos" ).is_some() {
            record.insert( "Pos", Value::from( i ) );
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use serde_json::json;


    fn transport_with( view: ViewId, uris: &[&str] ) -> FileTransport {
        let data = uris
            .iter()
            .enumerate()
            .map( |( i, u )| Record::try_from( json!({ "uri": u, "Type": "song", "Pos": i }) ).unwrap() )
            .collect();
        let mut transport = FileTransport::new( "/nonexistent" );
        transport.cache.insert( view, Response::ok( PageResult::new( 0, 0, uris.len() as i64, data ) ) );
        transport
    }


    fn uris( response: &Response ) -> Vec<String> {
        response.page().unwrap().data.iter().filter_map( |r| r.uri().map( str::to_string ) ).collect()
    }


    #[test]
    fn test_fetch_windows() {
        let mut transport = transport_with( ViewId::QueueCurrent, &[ "a", "b", "c", "d", "e" ] );
        let response = transport.fetch( ViewId::QueueCurrent, 2, 2 ).unwrap();
        let page = response.page().unwrap();
        assert_eq!( uris( &response ), vec![ "c", "d" ] );
        assert_eq!( page.total_entities, 5 );
        assert_eq!( page.returned_entities, 2 );
        assert_eq!( page.offset, 2 );
    }


    #[test]
    fn test_webradiodb_uses_client_window() {
        let mut transport = transport_with( ViewId::BrowseRadioWebradiodb, &[ "a", "b", "c", "d", "e" ] );
        let response = transport.fetch( ViewId::BrowseRadioWebradiodb, 2, 2 ).unwrap();
        assert_eq!( uris( &response ), vec![ "b", "c" ] );
    }


    #[test]
    fn test_move_renumbers() {
        let mut transport = transport_with( ViewId::QueueCurrent, &[ "a", "b", "c" ] );
        transport.move_entry( ViewId::QueueCurrent, 0, 2 ).unwrap();
        let response = transport.fetch( ViewId::QueueCurrent, 0, 10 ).unwrap();
        assert_eq!( uris( &response ), vec![ "b", "c", "a" ] );
        let positions: Vec<_> = response.page().unwrap().data.iter().map( |r| r.pos() ).collect();
        assert_eq!( positions, vec![ Some( 0 ), Some( 1 ), Some( 2 ) ] );

        assert!( matches!(
            transport.move_entry( ViewId::QueueCurrent, 0, 7 ),
            Err( TransportError::OutOfRange { pos: 7, .. } )
        ) );
    }


    #[test]
    fn test_remove_entry() {
        let mut transport = transport_with( ViewId::BrowsePlaylistDetail, &[ "a", "b" ] );
        transport.remove_entry( ViewId::BrowsePlaylistDetail, 0 ).unwrap();
        let response = transport.fetch( ViewId::BrowsePlaylistDetail, 0, 10 ).unwrap();
        assert_eq!( uris( &response ), vec![ "b" ] );
    }


    #[test]
    fn test_missing_fixture() {
        let mut transport = FileTransport::new( "/nonexistent/pages.json" );
        assert!( transport.fetch( ViewId::Search, 0, 10 ).is_err() );
    }


    #[test]
    fn test_demo_album_gets_disc_dividers() {
        use mpview_core::{ reconcile_response, ActionTemplate, AlbumDividers, RenderContext, ReconcileOptions, ViewContainer };

        let dir = Path::new( env!( "CARGO_MANIFEST_DIR" ) ).join( "../../demos/pages" );
        let mut transport = FileTransport::new( dir );
        let view = ViewId::BrowseDatabaseAlbumDetail;
        let response = transport.fetch( view, 0, 50 ).unwrap();

        let config = crate::settings::default_view_config( view );
        let actions = ActionTemplate::for_view( view );
        let ctx = RenderContext::new( &config, &actions );
        let mut opts = ReconcileOptions::new().with_dividers( AlbumDividers::new( false ) );
        let mut container = ViewContainer::new( view, config.mode );

        let stats = reconcile_response( &mut container, &response, &ctx, &mut opts ).unwrap();
        assert_eq!( stats.dividers, 2 );
        assert_eq!( container.len(), 7 );
        assert!( container.rows[ 0 ].not_clickable );
        assert_eq!( container.rows[ 4 ].data.extra( "Disc" ), Some( "2" ) );
    }


    #[test]
    fn test_demo_album_list_keeps_selection() {
        use mpview_core::{ reconcile_response, ActionTemplate, RenderContext, ReconcileOptions, ViewContainer };

        let dir = Path::new( env!( "CARGO_MANIFEST_DIR" ) ).join( "../../demos/pages" );
        let mut transport = FileTransport::new( dir );
        let view = ViewId::BrowseDatabaseAlbumList;
        let response = transport.fetch( view, 0, 50 ).unwrap();
        assert!( response.page().unwrap().data.iter().all( |r| r.uri().is_none() ) );

        let config = crate::settings::default_view_config( view );
        let actions = ActionTemplate::for_view( view );
        let ctx = RenderContext::new( &config, &actions );
        let mut container = ViewContainer::new( view, config.mode );
        container.set_select_mode( true );

        reconcile_response( &mut container, &response, &ctx, &mut ReconcileOptions::new() ).unwrap();
        container.rows[ 2 ].selected = true;
        reconcile_response( &mut container, &response, &ctx, &mut ReconcileOptions::new() ).unwrap();
        assert!( container.rows[ 2 ].selected );
        assert_eq!( container.selected_count(), 1 );
    }


    #[test]
    fn test_demo_error_fixture() {
        let dir = Path::new( env!( "CARGO_MANIFEST_DIR" ) ).join( "../../demos/pages" );
        let mut transport = FileTransport::new( dir );
        let response = transport.fetch( ViewId::QueueJukeboxSong, 0, 50 ).unwrap();
        assert!( response.page().is_err() );
    }


    #[test]
    fn test_parse_fixture_shapes() {
        let path = Path::new( "inline.json" );
        let bare = parse_fixture( json!({
            "offset": 0, "limit": 10, "totalEntities": 1, "returnedEntities": 1, "data": [ { "uri": "x" } ]
        }), path ).unwrap();
        assert!( bare.page().is_ok() );

        let failed = parse_fixture( json!({ "error": { "message": "boom" } }), path ).unwrap();
        assert!( failed.page().is_err() );
    }
}

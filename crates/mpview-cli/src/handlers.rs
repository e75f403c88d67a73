//! View handlers for the terminal front-end.
//!
//! Handlers run inside the engine's dispatch and cannot touch the app
//! directly, so they turn each event into a `ViewRequest` and send it over a
//! channel that the main loop drains on every tick.

use std::sync::mpsc::{ self, Receiver, Sender };

use mpview_core::{ EntryData, Reorder, ViewHandler, ViewId };


/// Work requested by a view handler.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum ViewRequest {
    /// Default activation of an entry (play it, open it, ...).
    Activate { view: ViewId, entry: EntryData },

    /// Open the context menu of an entry.
    ContextMenu { view: ViewId, entry: EntryData },

    /// An action-column link such as `quickPlay` or `quickRemove`.
    Action { view: ViewId, action: String, entry: EntryData },

    /// Persist a drag reorder.
    Move { view: ViewId, from: usize, to: usize },
}


/// Creates a channel for view requests.
pub fn create_request_channel() -> ( Sender<ViewRequest>, Receiver<ViewRequest> ) {
    mpsc::channel()
}


/// Handler for views that only activate and open menus.
pub struct BrowseHandler {
    tx: Sender<ViewRequest>,
}


impl BrowseHandler {
    pub fn new( tx: Sender<ViewRequest> ) -> Self {
        Self { tx }
    }
}


impl ViewHandler for BrowseHandler {
    fn activate( &mut self, view: ViewId, entry: &EntryData ) {
        send( &self.tx, ViewRequest::Activate { view, entry: entry.clone() } );
    }


    fn context_menu( &mut self, view: ViewId, entry: &EntryData ) {
        send( &self.tx, ViewRequest::ContextMenu { view, entry: entry.clone() } );
    }


    fn action( &mut self, view: ViewId, action: &str, entry: &EntryData ) {
        send( &self.tx, ViewRequest::Action { view, action: action.to_string(), entry: entry.clone() } );
    }
}


/// Handler for ordered collections (the queue and playlist contents) whose
/// rows can be dragged into a new position.
pub struct OrderedHandler {
    inner: BrowseHandler,
}


impl OrderedHandler {
    pub fn new( tx: Sender<ViewRequest> ) -> Self {
        Self { inner: BrowseHandler::new( tx ) }
    }
}


impl Reorder for OrderedHandler {
    fn move_entry( &mut self, view: ViewId, from: usize, to: usize ) {
        send( &self.inner.tx, ViewRequest::Move { view, from, to } );
    }
}


impl ViewHandler for OrderedHandler {
    fn activate( &mut self, view: ViewId, entry: &EntryData ) {
        self.inner.activate( view, entry );
    }


    fn context_menu( &mut self, view: ViewId, entry: &EntryData ) {
        self.inner.context_menu( view, entry );
    }


    fn action( &mut self, view: ViewId, action: &str, entry: &EntryData ) {
        self.inner.action( view, action, entry );
    }


    fn reorder( &mut self ) -> Option<&mut dyn Reorder> {
        Some( self as &mut dyn Reorder )
    }
}


/// Returns true for views whose rows can be reordered by dragging.
pub fn is_reorderable( view: ViewId ) -> bool {
    matches!( view, ViewId::QueueCurrent | ViewId::BrowsePlaylistDetail )
}


/// Builds the handler for a view.
pub fn handler_for( view: ViewId, tx: Sender<ViewRequest> ) -> Box<dyn ViewHandler> {
    if is_reorderable( view ) {
        Box::new( OrderedHandler::new( tx ) )
    } else {
        Box::new( BrowseHandler::new( tx ) )
    }
}


fn send( tx: &Sender<ViewRequest>, request: ViewRequest ) {
    if tx.send( request ).is_err() {
        tracing::warn!( "View request dropped: receiver is gone" );
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use mpview_core::{ ContainerManager, Dispatch, DropOutcome, RenderedRow, ViewConfig, ViewEvent, ViewMode };


    fn entry( uri: &str, pos: usize ) -> EntryData {
        EntryData { uri: Some( uri.into() ), pos: Some( pos ), ..EntryData::default() }
    }


    fn manager_with_rows( view: ViewId, tx: Sender<ViewRequest> ) -> ContainerManager {
        let mut manager = ContainerManager::new();
        manager.register( view, handler_for( view, tx ) );
        manager.ensure_container( view, &ViewConfig::new( ViewMode::Table, [ "Title" ] ) );
        let container = manager.container_mut( view ).unwrap();
        for ( i, uri ) in [ "a", "b", "c" ].iter().enumerate() {
            let mut row = RenderedRow::new();
            row.data = entry( uri, i );
            container.rows.push( row );
        }
        manager
    }


    #[test]
    fn test_activate_sends_request() {
        let ( tx, rx ) = create_request_channel();
        let mut manager = manager_with_rows( ViewId::Search, tx );

        let result = manager.dispatch( ViewId::Search, ViewEvent::Click { ordinal: 1, ctrl: false, shift: false } );
        assert_eq!( result, Dispatch::Activated );
        assert_eq!( rx.try_recv().unwrap(), ViewRequest::Activate { view: ViewId::Search, entry: entry( "b", 1 ) } );
    }


    #[test]
    fn test_action_link_sends_request() {
        let ( tx, rx ) = create_request_channel();
        let mut manager = manager_with_rows( ViewId::Search, tx );

        manager.dispatch( ViewId::Search, ViewEvent::ActionClick { ordinal: 0, action: "quickPlay".into() } );
        manager.dispatch( ViewId::Search, ViewEvent::ActionClick { ordinal: 2, action: "popover".into() } );

        assert!( matches!( rx.try_recv().unwrap(), ViewRequest::Action { ref action, .. } if action == "quickPlay" ) );
        assert!( matches!( rx.try_recv().unwrap(), ViewRequest::ContextMenu { .. } ) );
    }


    #[test]
    fn test_only_ordered_views_accept_drags() {
        let ( tx, _rx ) = create_request_channel();
        let mut manager = manager_with_rows( ViewId::Search, tx );
        assert_eq!( manager.dispatch( ViewId::Search, ViewEvent::DragStart { ordinal: 0 } ), Dispatch::Ignored );
    }


    #[test]
    fn test_drop_sends_move() {
        let ( tx, rx ) = create_request_channel();
        let mut manager = manager_with_rows( ViewId::QueueCurrent, tx );

        assert_eq!( manager.dispatch( ViewId::QueueCurrent, ViewEvent::DragStart { ordinal: 0 } ), Dispatch::Dragging );
        let result = manager.dispatch( ViewId::QueueCurrent, ViewEvent::Drop { ordinal: 2 } );
        assert_eq!( result, Dispatch::Dropped( DropOutcome::Moved { from: 0, to: 2 } ) );
        assert_eq!( rx.try_recv().unwrap(), ViewRequest::Move { view: ViewId::QueueCurrent, from: 0, to: 2 } );
    }


    #[test]
    fn test_send_without_receiver_does_not_panic() {
        let ( tx, rx ) = create_request_channel();
        drop( rx );
        let mut handler = BrowseHandler::new( tx );
        handler.activate( ViewId::Home, &EntryData::default() );
    }
}

//! View containers
//!
//! A container is the structural root of one view's rows: a table, a card
//! grid or a simple list. The manager rebuilds a container only when the
//! configured mode changes, wires up input handling per view, and routes
//! clicks, context menus and drag events to the handler registered for
//! the view.

use std::collections::HashMap;
use std::fmt;
use std::time::{ Duration, Instant };

use tracing::{ debug, info };

use crate::drag::{ DragController, DropOutcome, Reorder };
use crate::error::ViewError;
use crate::page::Pagination;
use crate::row::{ EntryData, NodeId, RenderedRow };
use crate::view::{ ViewConfig, ViewId, ViewMode };


/// Delay used to coalesce bursts of resize events.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis( 100 );


/// Input listeners installed on a container.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct Listeners {
    pub activate: bool,
    pub context_menu: bool,

    /// Pointer drag, only for reorderable views.
    pub drag: bool,
}


/// The structural root of one view.
#[derive( Debug )]
pub struct ViewContainer {
    view: ViewId,
    shape: ViewMode,
    listeners: Listeners,

    pub rows: Vec<RenderedRow>,
    pub select_mode: bool,

    /// Set while a refresh is pending, cleared by the next reconcile pass.
    pub updating: bool,
    pub pagination: Option<Pagination>,

    last_selected: Option<usize>,
    header_checked: bool,
}


impl ViewContainer {
    /// Creates an empty container with activate and context menu listeners.
    pub fn new( view: ViewId, shape: ViewMode ) -> Self {
        Self {
            view,
            shape,
            listeners: Listeners { activate: true, context_menu: true, drag: false },
            rows: Vec::new(),
            select_mode: false,
            updating: false,
            pagination: None,
            last_selected: None,
            header_checked: false,
        }
    }


    pub fn view( &self ) -> ViewId {
        self.view
    }


    /// Returns the mode the container was built for.
    pub fn shape( &self ) -> ViewMode {
        self.shape
    }


    pub fn listeners( &self ) -> Listeners {
        self.listeners
    }


    /// Returns the id of the row list, `<view>List`.
    pub fn list_id( &self ) -> String {
        self.view.list_id()
    }


    pub fn len( &self ) -> usize {
        self.rows.len()
    }


    pub fn is_empty( &self ) -> bool {
        self.rows.is_empty()
    }


    pub fn row( &self, ordinal: usize ) -> Option<&RenderedRow> {
        self.rows.get( ordinal )
    }


    /// Returns the ordinal of the node with the given id.
    pub fn position( &self, id: NodeId ) -> Option<usize> {
        self.rows.iter().position( |r| r.id() == id )
    }


    /// Turns select mode on or off; leaving it clears every selection.
    pub fn set_select_mode( &mut self, on: bool ) {
        self.select_mode = on;
        if !on {
            self.select_all( false );
        }
        self.last_selected = None;
        self.header_checked = false;
    }


    /// Selects or clears every selectable row.
    ///
    /// Selecting only picks rows of the same entry type as the first
    /// clickable row, so a selection never mixes songs and folders.
    ///
    /// @returns The number of selected rows afterwards
    pub fn select_all( &mut self, select: bool ) -> usize {
        let first_type = self.rows
            .iter()
            .find( |r| !r.not_clickable )
            .and_then( |r| r.data.entry_type );

        for row in self.rows.iter_mut().filter( |r| !r.not_clickable ) {
            if select && row.data.entry_type != first_type {
                continue;
            }
            row.selected = select;
        }
        self.header_checked = select;
        self.selected_count()
    }


    /// Flips the selection of one row.
    pub fn toggle_selected( &mut self, ordinal: usize ) -> bool {
        let Some( row ) = self.rows.get_mut( ordinal ) else {
            return false;
        };
        if row.not_clickable {
            return false;
        }
        row.selected = !row.selected;
        self.last_selected = Some( ordinal );
        true
    }


    /// Selects every row between the last selected row and `ordinal` that
    /// shares the type of the range's first row.
    pub fn select_range( &mut self, ordinal: usize ) {
        let last = self.last_selected.unwrap_or( 0 );
        let ( first, end ) = if last < ordinal { ( last, ordinal ) } else { ( ordinal, last ) };
        let end = end.min( self.rows.len().saturating_sub( 1 ) );
        self.last_selected = Some( ordinal );

        let Some( first_type ) = self.rows.get( first ).map( |r| r.data.entry_type ) else {
            return;
        };
        for row in self.rows[ first..=end ].iter_mut() {
            if row.data.entry_type == first_type && !row.not_clickable {
                row.selected = true;
            }
        }
    }


    pub fn selected_count( &self ) -> usize {
        self.rows.iter().filter( |r| r.selected ).count()
    }


    /// Returns the identity data of every selected row.
    pub fn selected_entries( &self ) -> Vec<&EntryData> {
        self.rows.iter().filter( |r| r.selected ).map( |r| &r.data ).collect()
    }


    /// Returns true if the selection holds a single entry type.
    pub fn selection_is_valid( &self ) -> bool {
        let mut types = self.rows.iter().filter( |r| r.selected ).map( |r| r.data.entry_type );
        match types.next() {
            Some( first ) => types.all( |t| t == first ),
            None => true,
        }
    }
}


impl fmt::Display for ViewContainer {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        write!( f, "{} mode={} rows={}", self.list_id(), self.shape.name(), self.rows.len() )?;
        if self.select_mode {
            f.write_str( " select" )?;
        }
        if self.updating {
            f.write_str( " updating" )?;
        }
        writeln!( f )?;
        for ( i, row ) in self.rows.iter().enumerate() {
            writeln!( f, "{:>3} {}", i, row )?;
        }
        Ok(())
    }
}


/// Business logic of one view.
pub trait ViewHandler {
    /// Default row activation.
    fn activate( &mut self, view: ViewId, entry: &EntryData );

    /// Opens the context menu for an entry.
    fn context_menu( &mut self, view: ViewId, entry: &EntryData );

    /// Handles an action-column link other than `popover`.
    fn action( &mut self, view: ViewId, action: &str, entry: &EntryData ) {
        debug!( "Unhandled action {} on {} for {:?}", action, view, entry.uri );
    }

    /// Returns the reorder delegate for views whose rows can be dragged.
    fn reorder( &mut self ) -> Option<&mut dyn Reorder> {
        None
    }
}


/// An input event delivered to a view.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum ViewEvent {
    Click { ordinal: usize, ctrl: bool, shift: bool },
    HeaderClick,
    ActionClick { ordinal: usize, action: String },

    /// Right click or long press.
    ContextMenu { ordinal: usize },

    DragStart { ordinal: usize },
    DragEnter { ordinal: usize },
    DragLeave { ordinal: usize },
    DragOver,
    Drop { ordinal: usize },
    DragEnd,
}


/// What a dispatched event did.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum Dispatch {
    /// No listener or target for the event.
    Ignored,

    /// Selection changed; carries the number of selected rows.
    Selection( usize ),

    Activated,
    ContextMenu,
    Action( String ),

    /// A drag step was applied.
    Dragging,

    /// Whether a drop is currently accepted.
    DragAccepted( bool ),

    Dropped( DropOutcome ),
}


/// Owns every view container, the registered handlers and the drag state.
pub struct ContainerManager {
    containers: HashMap<ViewId, ViewContainer>,
    handlers: HashMap<ViewId, Box<dyn ViewHandler>>,
    drag: DragController,
}


impl Default for ContainerManager {
    fn default() -> Self {
        Self::new()
    }
}


impl ContainerManager {
    pub fn new() -> Self {
        Self {
            containers: HashMap::new(),
            handlers: HashMap::new(),
            drag: DragController::new(),
        }
    }


    /// Registers the handler of a view, replacing any previous one.
    pub fn register( &mut self, view: ViewId, handler: Box<dyn ViewHandler> ) {
        self.handlers.insert( view, handler );
        let drag = self.drag_enabled( view );
        if let Some( container ) = self.containers.get_mut( &view ) {
            container.listeners.drag = drag && container.shape == ViewMode::Table;
        }
    }


    /// Makes sure the view's container matches the configured mode.
    ///
    /// An unchanged mode is a no-op. Otherwise a fresh, empty container is
    /// built so no node of the old shape survives the swap.
    ///
    /// @returns true if the container was (re)built
    pub fn ensure_container( &mut self, view: ViewId, config: &ViewConfig ) -> bool {
        if self.containers.get( &view ).is_some_and( |c| c.shape == config.mode ) {
            return false;
        }

        if self.drag.session().is_some_and( |s| s.view == view ) {
            self.drag.cancel();
        }

        let mut container = ViewContainer::new( view, config.mode );
        container.listeners.drag = config.mode == ViewMode::Table && self.drag_enabled( view );
        info!( "Building {} container for {}", config.mode.name(), view );
        self.containers.insert( view, container );
        true
    }


    pub fn container( &self, view: ViewId ) -> Option<&ViewContainer> {
        self.containers.get( &view )
    }


    pub fn container_mut( &mut self, view: ViewId ) -> Option<&mut ViewContainer> {
        self.containers.get_mut( &view )
    }


    /// Returns the view's container, or `ViewError::NoContainer`.
    pub fn try_container_mut( &mut self, view: ViewId ) -> Result<&mut ViewContainer, ViewError> {
        self.containers
            .get_mut( &view )
            .ok_or_else( || ViewError::NoContainer( view.to_string() ) )
    }


    pub fn drag( &self ) -> &DragController {
        &self.drag
    }


    /// Ends any active drag against the container it started in.
    pub fn end_drag( &mut self ) {
        let Some( view ) = self.drag.session().map( |s| s.view ) else {
            return;
        };
        match self.containers.get_mut( &view ) {
            Some( container ) => self.drag.drag_end( container ),
            None => self.drag.cancel(),
        }
    }


    /// Routes an input event of a view.
    ///
    /// Clicks go to selection first while select mode is on (a ctrl-click
    /// turns it on), then to action links, then to row activation.
    pub fn dispatch( &mut self, view: ViewId, event: ViewEvent ) -> Dispatch {
        let foreign = self.drag.session().is_some_and( |s| s.view != view );
        match event {
            ViewEvent::Drop { .. } if foreign => {
                self.end_drag();
                return Dispatch::Dropped( DropOutcome::Aborted );
            }
            ViewEvent::DragEnd if foreign => {
                self.end_drag();
                return Dispatch::Dragging;
            }
            _ => {}
        }

        let Some( container ) = self.containers.get_mut( &view ) else {
            return Dispatch::Ignored;
        };
        let listeners = container.listeners;

        match event {
            ViewEvent::Click { ordinal, ctrl, shift } => {
                if !listeners.activate {
                    return Dispatch::Ignored;
                }
                if let Some( selected ) = select_click( container, ordinal, ctrl, shift ) {
                    return selected;
                }
                let Some( row ) = container.rows.get( ordinal ).filter( |r| !r.not_clickable ) else {
                    return Dispatch::Ignored;
                };
                match self.handlers.get_mut( &view ) {
                    Some( handler ) => {
                        handler.activate( view, &row.data );
                        Dispatch::Activated
                    }
                    None => Dispatch::Ignored,
                }
            }

            ViewEvent::HeaderClick => {
                if !listeners.activate || !container.select_mode {
                    return Dispatch::Ignored;
                }
                let select = !container.header_checked;
                Dispatch::Selection( container.select_all( select ) )
            }

            ViewEvent::ActionClick { ordinal, action } => {
                if !listeners.activate {
                    return Dispatch::Ignored;
                }
                if let Some( selected ) = select_click( container, ordinal, false, false ) {
                    return selected;
                }
                let Some( row ) = container.rows.get( ordinal ) else {
                    return Dispatch::Ignored;
                };
                let Some( handler ) = self.handlers.get_mut( &view ) else {
                    return Dispatch::Ignored;
                };
                if action == "popover" {
                    handler.context_menu( view, &row.data );
                    Dispatch::ContextMenu
                } else {
                    handler.action( view, &action, &row.data );
                    Dispatch::Action( action )
                }
            }

            ViewEvent::ContextMenu { ordinal } => {
                if !listeners.context_menu {
                    return Dispatch::Ignored;
                }
                let Some( row ) = container.rows.get( ordinal ).filter( |r| !r.not_clickable ) else {
                    return Dispatch::Ignored;
                };
                match self.handlers.get_mut( &view ) {
                    Some( handler ) => {
                        handler.context_menu( view, &row.data );
                        Dispatch::ContextMenu
                    }
                    None => Dispatch::Ignored,
                }
            }

            ViewEvent::Drop { .. } | ViewEvent::DragEnd if !listeners.drag => {
                self.drag.drag_end( container );
                Dispatch::Ignored
            }

            _ if !listeners.drag => Dispatch::Ignored,

            ViewEvent::DragStart { ordinal } => {
                if self.drag.drag_start( container, ordinal ) {
                    Dispatch::Dragging
                } else {
                    Dispatch::Ignored
                }
            }

            ViewEvent::DragEnter { ordinal } => {
                self.drag.drag_enter( container, ordinal );
                Dispatch::Dragging
            }

            ViewEvent::DragLeave { ordinal } => {
                self.drag.drag_leave( container, ordinal );
                Dispatch::Dragging
            }

            ViewEvent::DragOver => Dispatch::DragAccepted( self.drag.drag_over() ),

            ViewEvent::Drop { ordinal } => {
                let Some( reorder ) = self.handlers.get_mut( &view ).and_then( |h| h.reorder() ) else {
                    self.drag.drag_end( container );
                    return Dispatch::Ignored;
                };
                Dispatch::Dropped( self.drag.drop( container, ordinal, reorder ) )
            }

            ViewEvent::DragEnd => {
                self.drag.drag_end( container );
                Dispatch::Dragging
            }
        }
    }


    fn drag_enabled( &mut self, view: ViewId ) -> bool {
        self.handlers.get_mut( &view ).is_some_and( |h| h.reorder().is_some() )
    }
}


/// Applies a click to the selection if the container is, or enters, select mode.
fn select_click( container: &mut ViewContainer, ordinal: usize, ctrl: bool, shift: bool ) -> Option<Dispatch> {
    if ctrl && !container.select_mode {
        container.set_select_mode( true );
    } else if !container.select_mode {
        return None;
    }

    match container.rows.get( ordinal ) {
        Some( row ) if !row.not_clickable => {}
        _ => return Some( Dispatch::Selection( container.selected_count() ) ),
    }
    if shift {
        container.select_range( ordinal );
    } else {
        container.toggle_selected( ordinal );
    }
    Some( Dispatch::Selection( container.selected_count() ) )
}


/// Coalesces resize events: a layout pass is due once no resize arrived for
/// the debounce delay.
#[derive( Debug, Clone )]
pub struct ResizeDebouncer {
    delay: Duration,
    due_at: Option<Instant>,
    width: u32,
}


impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new( RESIZE_DEBOUNCE )
    }
}


impl ResizeDebouncer {
    pub fn new( delay: Duration ) -> Self {
        Self { delay, due_at: None, width: 0 }
    }


    /// Records a resize at `now`, pushing the pending pass back.
    pub fn resized( &mut self, width: u32, now: Instant ) {
        self.width = width;
        self.due_at = Some( now + self.delay );
    }


    /// Returns the latest width once the delay has passed, consuming the
    /// pending pass.
    pub fn poll( &mut self, now: Instant ) -> Option<u32> {
        match self.due_at {
            Some( due ) if now >= due => {
                self.due_at = None;
                Some( self.width )
            }
            _ => None,
        }
    }


    pub fn is_pending( &self ) -> bool {
        self.due_at.is_some()
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::page::{ EntryType, PageResult, Record };
    use crate::reconcile::{ reconcile, ReconcileOptions };
    use crate::render::{ ActionTemplate, RenderContext };
    use serde_json::json;


    #[derive( Default )]
    struct Log {
        calls: Vec<String>,
    }


    struct Recorder {
        log: Rc<RefCell<Log>>,
        reorderable: bool,
    }


    impl Reorder for Recorder {
        fn move_entry( &mut self, view: ViewId, from: usize, to: usize ) {
            self.log.borrow_mut().calls.push( format!( "move {} {} {}", view, from, to ) );
        }
    }


    impl ViewHandler for Recorder {
        fn activate( &mut self, _view: ViewId, entry: &EntryData ) {
            self.log.borrow_mut().calls.push( format!( "activate {}", entry.uri.as_deref().unwrap_or( "-" ) ) );
        }


        fn context_menu( &mut self, _view: ViewId, entry: &EntryData ) {
            self.log.borrow_mut().calls.push( format!( "menu {}", entry.uri.as_deref().unwrap_or( "-" ) ) );
        }


        fn action( &mut self, _view: ViewId, action: &str, entry: &EntryData ) {
            self.log.borrow_mut().calls.push( format!( "{} {}", action, entry.uri.as_deref().unwrap_or( "-" ) ) );
        }


        fn reorder( &mut self ) -> Option<&mut dyn Reorder> {
            if self.reorderable { Some( self as &mut dyn Reorder ) } else { None }
        }
    }


    fn setup( view: ViewId, reorderable: bool ) -> ( ContainerManager, Rc<RefCell<Log>> ) {
        let log = Rc::new( RefCell::new( Log::default() ) );
        let mut manager = ContainerManager::new();
        manager.register( view, Box::new( Recorder { log: log.clone(), reorderable } ) );
        ( manager, log )
    }


    fn fill( manager: &mut ContainerManager, view: ViewId, config: &ViewConfig, n: usize ) {
        let data = ( 0..n )
            .map( |i| Record::try_from( json!({ "uri": format!( "s{}", i ), "Type": "song", "Pos": i }) ).unwrap() )
            .collect();
        let page = PageResult::new( 0, 100, n as i64, data );
        let actions = ActionTemplate::for_view( view );
        let ctx = RenderContext::new( config, &actions );
        let container = manager.container_mut( view ).unwrap();
        reconcile( container, &page, &ctx, &mut ReconcileOptions::new() );
    }


    #[test]
    fn test_ensure_container_is_noop_for_same_mode() {
        let ( mut manager, _ ) = setup( ViewId::Search, false );
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        assert!( manager.ensure_container( ViewId::Search, &config ) );
        fill( &mut manager, ViewId::Search, &config, 3 );
        assert!( !manager.ensure_container( ViewId::Search, &config ) );
        assert_eq!( manager.container( ViewId::Search ).unwrap().len(), 3 );
    }


    #[test]
    fn test_mode_switch_rebuilds_from_scratch() {
        let ( mut manager, _ ) = setup( ViewId::BrowseDatabaseAlbumList, false );
        let table = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        manager.ensure_container( ViewId::BrowseDatabaseAlbumList, &table );
        fill( &mut manager, ViewId::BrowseDatabaseAlbumList, &table, 5 );
        let old_ids: Vec<NodeId> = manager.container( ViewId::BrowseDatabaseAlbumList ).unwrap()
            .rows.iter().map( |r| r.id() ).collect();

        let grid = ViewConfig::new( ViewMode::Grid, [ "Thumbnail", "Title" ] );
        assert!( manager.ensure_container( ViewId::BrowseDatabaseAlbumList, &grid ) );
        let container = manager.container( ViewId::BrowseDatabaseAlbumList ).unwrap();
        assert!( container.is_empty() );
        assert_eq!( container.shape(), ViewMode::Grid );
        assert_eq!( container.list_id(), "BrowseDatabaseAlbumListList" );

        fill( &mut manager, ViewId::BrowseDatabaseAlbumList, &grid, 5 );
        let container = manager.container( ViewId::BrowseDatabaseAlbumList ).unwrap();
        assert_eq!( container.len(), 5 );
        assert!( container.rows.iter().all( |r| !old_ids.contains( &r.id() ) ) );
    }


    #[test]
    fn test_drag_listener_only_for_reorderable_tables() {
        let ( mut manager, _ ) = setup( ViewId::QueueCurrent, true );
        manager.register( ViewId::Search, Box::new( Recorder {
            log: Rc::new( RefCell::new( Log::default() ) ),
            reorderable: false,
        } ) );

        let table = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        manager.ensure_container( ViewId::QueueCurrent, &table );
        manager.ensure_container( ViewId::Search, &table );
        assert!( manager.container( ViewId::QueueCurrent ).unwrap().listeners().drag );
        assert!( !manager.container( ViewId::Search ).unwrap().listeners().drag );

        let list = ViewConfig::new( ViewMode::List, [ "Title" ] );
        manager.ensure_container( ViewId::QueueCurrent, &list );
        assert!( !manager.container( ViewId::QueueCurrent ).unwrap().listeners().drag );
        assert_eq!( manager.dispatch( ViewId::QueueCurrent, ViewEvent::DragStart { ordinal: 0 } ), Dispatch::Ignored );
    }


    #[test]
    fn test_click_routes_to_activate_and_actions() {
        let ( mut manager, log ) = setup( ViewId::QueueCurrent, false );
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        manager.ensure_container( ViewId::QueueCurrent, &config );
        fill( &mut manager, ViewId::QueueCurrent, &config, 2 );

        let view = ViewId::QueueCurrent;
        assert_eq!( manager.dispatch( view, ViewEvent::Click { ordinal: 1, ctrl: false, shift: false } ), Dispatch::Activated );
        assert_eq!(
            manager.dispatch( view, ViewEvent::ActionClick { ordinal: 0, action: "popover".to_string() } ),
            Dispatch::ContextMenu
        );
        assert_eq!(
            manager.dispatch( view, ViewEvent::ActionClick { ordinal: 0, action: "quickRemove".to_string() } ),
            Dispatch::Action( "quickRemove".to_string() )
        );
        assert_eq!( manager.dispatch( view, ViewEvent::ContextMenu { ordinal: 1 } ), Dispatch::ContextMenu );
        assert_eq!( manager.dispatch( view, ViewEvent::Click { ordinal: 9, ctrl: false, shift: false } ), Dispatch::Ignored );

        assert_eq!( log.borrow().calls, vec![ "activate s1", "menu s0", "quickRemove s0", "menu s1" ] );
    }


    #[test]
    fn test_context_menu_ignores_dividers() {
        let ( mut manager, log ) = setup( ViewId::BrowseDatabaseAlbumDetail, false );
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        manager.ensure_container( ViewId::BrowseDatabaseAlbumDetail, &config );
        fill( &mut manager, ViewId::BrowseDatabaseAlbumDetail, &config, 1 );
        manager.container_mut( ViewId::BrowseDatabaseAlbumDetail ).unwrap().rows[ 0 ].not_clickable = true;

        let view = ViewId::BrowseDatabaseAlbumDetail;
        assert_eq!( manager.dispatch( view, ViewEvent::ContextMenu { ordinal: 0 } ), Dispatch::Ignored );
        assert_eq!( manager.dispatch( view, ViewEvent::Click { ordinal: 0, ctrl: false, shift: false } ), Dispatch::Ignored );
        assert!( log.borrow().calls.is_empty() );
    }


    #[test]
    fn test_ctrl_click_enters_select_mode() {
        let ( mut manager, log ) = setup( ViewId::QueueCurrent, false );
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        manager.ensure_container( ViewId::QueueCurrent, &config );
        fill( &mut manager, ViewId::QueueCurrent, &config, 4 );
        let view = ViewId::QueueCurrent;

        assert_eq!( manager.dispatch( view, ViewEvent::Click { ordinal: 0, ctrl: true, shift: false } ), Dispatch::Selection( 1 ) );
        assert!( manager.container( view ).unwrap().select_mode );

        // further clicks select instead of activating, shift selects a range
        assert_eq!( manager.dispatch( view, ViewEvent::Click { ordinal: 2, ctrl: false, shift: true } ), Dispatch::Selection( 3 ) );
        assert_eq!(
            manager.dispatch( view, ViewEvent::ActionClick { ordinal: 1, action: "popover".to_string() } ),
            Dispatch::Selection( 2 )
        );
        assert!( log.borrow().calls.is_empty() );

        let uris: Vec<_> = manager.container( view ).unwrap()
            .selected_entries()
            .iter()
            .map( |e| e.uri.clone().unwrap_or_default() )
            .collect();
        assert_eq!( uris, vec![ "s0", "s2" ] );
    }


    #[test]
    fn test_header_click_selects_all() {
        let ( mut manager, _ ) = setup( ViewId::Search, false );
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        manager.ensure_container( ViewId::Search, &config );
        fill( &mut manager, ViewId::Search, &config, 3 );
        let view = ViewId::Search;

        assert_eq!( manager.dispatch( view, ViewEvent::HeaderClick ), Dispatch::Ignored );
        manager.container_mut( view ).unwrap().set_select_mode( true );
        assert_eq!( manager.dispatch( view, ViewEvent::HeaderClick ), Dispatch::Selection( 3 ) );
        assert_eq!( manager.dispatch( view, ViewEvent::HeaderClick ), Dispatch::Selection( 0 ) );
    }


    #[test]
    fn test_select_all_keeps_one_type() {
        let mut container = ViewContainer::new( ViewId::BrowseFilesystem, ViewMode::List );
        for ( i, t ) in [ EntryType::Dir, EntryType::Song, EntryType::Dir ].iter().enumerate() {
            let mut row = RenderedRow::new();
            row.data.uri = Some( i.to_string() );
            row.data.entry_type = Some( *t );
            container.rows.push( row );
        }
        container.set_select_mode( true );
        assert_eq!( container.select_all( true ), 2 );
        assert!( !container.rows[ 1 ].selected );
        assert!( container.selection_is_valid() );

        container.rows[ 1 ].selected = true;
        assert!( !container.selection_is_valid() );

        container.set_select_mode( false );
        assert_eq!( container.selected_count(), 0 );
    }


    #[test]
    fn test_drag_and_drop_through_dispatch() {
        let ( mut manager, log ) = setup( ViewId::QueueCurrent, true );
        let config = ViewConfig::new( ViewMode::Table, [ "Pos", "Title" ] );
        manager.ensure_container( ViewId::QueueCurrent, &config );
        fill( &mut manager, ViewId::QueueCurrent, &config, 3 );
        let view = ViewId::QueueCurrent;

        assert_eq!( manager.dispatch( view, ViewEvent::DragOver ), Dispatch::DragAccepted( false ) );
        assert_eq!( manager.dispatch( view, ViewEvent::DragStart { ordinal: 0 } ), Dispatch::Dragging );
        assert_eq!( manager.dispatch( view, ViewEvent::DragOver ), Dispatch::DragAccepted( true ) );
        assert_eq!(
            manager.dispatch( view, ViewEvent::Drop { ordinal: 2 } ),
            Dispatch::Dropped( DropOutcome::Moved { from: 0, to: 2 } )
        );
        manager.dispatch( view, ViewEvent::DragEnd );

        assert_eq!( log.borrow().calls, vec![ "move QueueCurrent 0 2" ] );
        let container = manager.container( view ).unwrap();
        assert!( container.updating );
        assert!( container.rows[ 0 ].hidden );
    }


    #[test]
    fn test_mode_switch_cancels_drag() {
        let ( mut manager, _ ) = setup( ViewId::QueueCurrent, true );
        let table = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        manager.ensure_container( ViewId::QueueCurrent, &table );
        fill( &mut manager, ViewId::QueueCurrent, &table, 2 );
        manager.dispatch( ViewId::QueueCurrent, ViewEvent::DragStart { ordinal: 1 } );
        assert!( manager.drag().is_dragging() );

        manager.ensure_container( ViewId::QueueCurrent, &ViewConfig::new( ViewMode::Grid, [ "Title" ] ) );
        assert!( !manager.drag().is_dragging() );
    }


    #[test]
    fn test_drop_in_another_view_ends_drag() {
        let ( mut manager, log ) = setup( ViewId::QueueCurrent, true );
        manager.register( ViewId::BrowsePlaylistDetail, Box::new( Recorder { log: log.clone(), reorderable: true } ) );
        let table = ViewConfig::new( ViewMode::Table, [ "Pos", "Title" ] );
        manager.ensure_container( ViewId::QueueCurrent, &table );
        manager.ensure_container( ViewId::BrowsePlaylistDetail, &table );
        fill( &mut manager, ViewId::QueueCurrent, &table, 3 );
        fill( &mut manager, ViewId::BrowsePlaylistDetail, &table, 5 );

        manager.dispatch( ViewId::QueueCurrent, ViewEvent::DragStart { ordinal: 0 } );
        assert!( manager.container( ViewId::QueueCurrent ).unwrap().rows[ 0 ].dimmed );

        assert_eq!(
            manager.dispatch( ViewId::BrowsePlaylistDetail, ViewEvent::Drop { ordinal: 4 } ),
            Dispatch::Dropped( DropOutcome::Aborted )
        );
        assert!( log.borrow().calls.is_empty() );
        assert!( !manager.drag().is_dragging() );
        assert!( !manager.container( ViewId::QueueCurrent ).unwrap().rows[ 0 ].dimmed );
        assert!( !manager.container( ViewId::BrowsePlaylistDetail ).unwrap().updating );
    }


    #[test]
    fn test_drop_without_drag_listener_clears_session() {
        let ( mut manager, _ ) = setup( ViewId::QueueCurrent, true );
        manager.register( ViewId::Search, Box::new( Recorder {
            log: Rc::new( RefCell::new( Log::default() ) ),
            reorderable: false,
        } ) );
        let table = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        manager.ensure_container( ViewId::QueueCurrent, &table );
        manager.ensure_container( ViewId::Search, &table );
        fill( &mut manager, ViewId::QueueCurrent, &table, 2 );
        fill( &mut manager, ViewId::Search, &table, 2 );

        manager.dispatch( ViewId::QueueCurrent, ViewEvent::DragStart { ordinal: 1 } );
        manager.dispatch( ViewId::Search, ViewEvent::Drop { ordinal: 0 } );
        assert!( !manager.drag().is_dragging() );

        // a later drag is accepted again
        assert_eq!( manager.dispatch( ViewId::QueueCurrent, ViewEvent::DragStart { ordinal: 0 } ), Dispatch::Dragging );
    }


    #[test]
    fn test_end_drag_restores_source_view() {
        let ( mut manager, _ ) = setup( ViewId::QueueCurrent, true );
        let table = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        manager.ensure_container( ViewId::QueueCurrent, &table );
        fill( &mut manager, ViewId::QueueCurrent, &table, 2 );

        manager.dispatch( ViewId::QueueCurrent, ViewEvent::DragStart { ordinal: 1 } );
        manager.end_drag();
        assert!( !manager.drag().is_dragging() );
        assert!( !manager.container( ViewId::QueueCurrent ).unwrap().rows[ 1 ].dimmed );
    }


    #[test]
    fn test_try_container_mut_reports_missing_view() {
        let mut manager = ContainerManager::new();
        assert_eq!(
            manager.try_container_mut( ViewId::Search ).err(),
            Some( ViewError::NoContainer( "Search".to_string() ) )
        );
        manager.ensure_container( ViewId::Search, &ViewConfig::new( ViewMode::List, [ "Title" ] ) );
        assert!( manager.try_container_mut( ViewId::Search ).is_ok() );
    }


    #[test]
    fn test_resize_debounce_coalesces() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::default();
        debouncer.resized( 80, start );
        debouncer.resized( 100, start + Duration::from_millis( 50 ) );

        assert_eq!( debouncer.poll( start + Duration::from_millis( 120 ) ), None );
        assert_eq!( debouncer.poll( start + Duration::from_millis( 150 ) ), Some( 100 ) );
        assert_eq!( debouncer.poll( start + Duration::from_millis( 400 ) ), None );
        assert!( !debouncer.is_pending() );
    }
}

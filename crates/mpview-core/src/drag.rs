//! Drag reorder
//!
//! Tracks at most one drag session. A session starts on a clickable row that
//! carries a position, and ends either on drop or unconditionally on drag
//! end. A successful drop hides the source row right away and hands the move
//! to the view; the next page refresh shows the authoritative order.

use tracing::debug;

use crate::container::ViewContainer;
use crate::row::NodeId;
use crate::view::ViewId;


/// Applies a move in the view's backing collection.
pub trait Reorder {
    /// Moves the entry at `from` to `to`; both are 0-indexed positions.
    fn move_entry( &mut self, view: ViewId, from: usize, to: usize );
}


/// The row being dragged.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct DragSession {
    pub view: ViewId,
    pub source: NodeId,
    pub source_pos: usize,
}


/// Result of a drop.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum DropOutcome {
    /// Nothing moved and no request was issued.
    Aborted,

    /// The move was handed to the view.
    Moved { from: usize, to: usize },
}


/// Drag state machine: idle while `session` is `None`.
#[derive( Debug, Default )]
pub struct DragController {
    session: Option<DragSession>,
}


impl DragController {
    pub fn new() -> Self {
        Self::default()
    }


    /// Returns the active session, if any.
    pub fn session( &self ) -> Option<&DragSession> {
        self.session.as_ref()
    }


    pub fn is_dragging( &self ) -> bool {
        self.session.is_some()
    }


    /// Starts dragging the row at `ordinal`.
    ///
    /// @returns false if a drag is already active or the row cannot be dragged
    pub fn drag_start( &mut self, container: &mut ViewContainer, ordinal: usize ) -> bool {
        if self.session.is_some() {
            return false;
        }
        let view = container.view();
        let Some( row ) = container.rows.get_mut( ordinal ) else {
            return false;
        };
        if row.not_clickable || row.hidden {
            return false;
        }
        let Some( source_pos ) = row.data.pos else {
            return false;
        };

        row.dimmed = true;
        self.session = Some( DragSession { view, source: row.id(), source_pos } );
        debug!( "Drag started on {} at position {}", view, source_pos );
        true
    }


    /// Marks the row under the pointer as a drop target.
    pub fn drag_enter( &mut self, container: &mut ViewContainer, ordinal: usize ) {
        self.set_hover( container, ordinal, true );
    }


    /// Clears the drop-target mark of a row the pointer left.
    pub fn drag_leave( &mut self, container: &mut ViewContainer, ordinal: usize ) {
        self.set_hover( container, ordinal, false );
    }


    /// Returns true if a drop would currently be accepted.
    pub fn drag_over( &self ) -> bool {
        self.session.is_some()
    }


    /// Drops the dragged row onto the row at `ordinal`.
    ///
    /// A target without a position, or with the source's own position,
    /// aborts silently and restores the source row. A drop into a container
    /// of another view ends the session without touching that container.
    pub fn drop( &mut self, container: &mut ViewContainer, ordinal: usize, reorder: &mut dyn Reorder ) -> DropOutcome {
        let Some( session ) = self.session.take() else {
            return DropOutcome::Aborted;
        };
        if container.view() != session.view {
            debug!( "Drop on {} ignored, drag belongs to {}", container.view(), session.view );
            return DropOutcome::Aborted;
        }
        for row in container.rows.iter_mut() {
            row.drag_over = false;
        }

        let source = source_index( container, &session );
        if let Some( i ) = source {
            container.rows[ i ].dimmed = false;
        }

        let target_pos = container.rows
            .get( ordinal )
            .filter( |r| !r.not_clickable && !r.hidden )
            .and_then( |r| r.data.pos );

        let to = match target_pos {
            Some( to ) if to != session.source_pos => to,
            _ => {
                debug!( "Drop on {} aborted", session.view );
                return DropOutcome::Aborted;
            }
        };

        if let Some( i ) = source {
            let row = &mut container.rows[ i ];
            row.hidden = true;
            row.data.uri = None;
        }
        container.updating = true;
        reorder.move_entry( session.view, session.source_pos, to );
        DropOutcome::Moved { from: session.source_pos, to }
    }


    /// Ends the drag wherever the pointer is, restoring the source row.
    ///
    /// Rows are only touched when `container` belongs to the dragged view.
    pub fn drag_end( &mut self, container: &mut ViewContainer ) {
        let Some( session ) = self.session.take() else {
            return;
        };
        if container.view() != session.view {
            return;
        }
        for row in container.rows.iter_mut() {
            row.drag_over = false;
        }
        if let Some( i ) = source_index( container, &session ) {
            container.rows[ i ].dimmed = false;
        }
    }


    /// Drops the session without touching any rows.
    ///
    /// Used when the container it refers to has been rebuilt.
    pub fn cancel( &mut self ) {
        self.session = None;
    }


    fn set_hover( &self, container: &mut ViewContainer, ordinal: usize, on: bool ) {
        if !self.session.is_some_and( |s| s.view == container.view() ) {
            return;
        }
        if let Some( row ) = container.rows.get_mut( ordinal ) {
            row.drag_over = on;
        }
    }
}


/// Finds the source row, provided its slot still holds the dragged entry.
///
/// A refresh during the drag keeps the node but may rebind it to another
/// record.
fn source_index( container: &ViewContainer, session: &DragSession ) -> Option<usize> {
    container
        .position( session.source )
        .filter( |i| container.rows[ *i ].data.pos == Some( session.source_pos ) )
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::row::RenderedRow;
    use crate::view::ViewMode;


    #[derive( Default )]
    struct Moves( Vec<( ViewId, usize, usize )> );


    impl Reorder for Moves {
        fn move_entry( &mut self, view: ViewId, from: usize, to: usize ) {
            self.0.push( ( view, from, to ) );
        }
    }


    fn queue( n: usize ) -> ViewContainer {
        let mut container = ViewContainer::new( ViewId::QueueCurrent, ViewMode::Table );
        for i in 0..n {
            let mut row = RenderedRow::new();
            row.data.uri = Some( format!( "song{}", i ) );
            row.data.pos = Some( i );
            container.rows.push( row );
        }
        container
    }


    #[test]
    fn test_drop_moves_and_hides_source() {
        let mut container = queue( 4 );
        let mut drag = DragController::new();
        let mut moves = Moves::default();

        assert!( drag.drag_start( &mut container, 1 ) );
        assert!( container.rows[ 1 ].dimmed );
        drag.drag_enter( &mut container, 3 );
        assert!( container.rows[ 3 ].drag_over );
        assert!( drag.drag_over() );

        let outcome = drag.drop( &mut container, 3, &mut moves );
        assert_eq!( outcome, DropOutcome::Moved { from: 1, to: 3 } );
        assert_eq!( moves.0, vec![ ( ViewId::QueueCurrent, 1, 3 ) ] );
        assert!( container.rows[ 1 ].hidden );
        assert!( container.rows[ 1 ].data.uri.is_none() );
        assert!( !container.rows[ 3 ].drag_over );
        assert!( container.updating );
        assert!( !drag.is_dragging() );

        drag.drag_end( &mut container );
        assert!( !container.rows[ 1 ].dimmed );
    }


    #[test]
    fn test_drop_on_self_is_noop() {
        let mut container = queue( 3 );
        let before = container.to_string();
        let mut drag = DragController::new();
        let mut moves = Moves::default();

        drag.drag_start( &mut container, 2 );
        drag.drag_enter( &mut container, 2 );
        assert_eq!( drag.drop( &mut container, 2, &mut moves ), DropOutcome::Aborted );
        drag.drag_end( &mut container );

        assert!( moves.0.is_empty() );
        assert_eq!( container.to_string(), before );
    }


    #[test]
    fn test_drop_outside_rows_aborts() {
        let mut container = queue( 2 );
        let mut drag = DragController::new();
        let mut moves = Moves::default();

        drag.drag_start( &mut container, 0 );
        assert_eq!( drag.drop( &mut container, 9, &mut moves ), DropOutcome::Aborted );
        assert!( !container.rows[ 0 ].dimmed );
        assert!( !container.updating );
        assert!( moves.0.is_empty() );
    }


    #[test]
    fn test_drag_end_restores_without_drop() {
        let mut container = queue( 2 );
        let mut drag = DragController::new();

        drag.drag_start( &mut container, 0 );
        drag.drag_enter( &mut container, 1 );
        drag.drag_end( &mut container );

        assert!( !drag.is_dragging() );
        assert!( !container.rows[ 0 ].dimmed );
        assert!( !container.rows[ 1 ].drag_over );
        assert!( !drag.drag_over() );
    }


    #[test]
    fn test_only_one_session() {
        let mut container = queue( 3 );
        let mut drag = DragController::new();
        assert!( drag.drag_start( &mut container, 0 ) );
        assert!( !drag.drag_start( &mut container, 1 ) );
        assert_eq!( drag.session().map( |s| s.source_pos ), Some( 0 ) );
    }


    #[test]
    fn test_rows_without_pos_cannot_drag() {
        let mut container = queue( 1 );
        let mut divider = RenderedRow::new();
        divider.not_clickable = true;
        divider.data.pos = Some( 5 );
        container.rows.push( divider );
        container.rows.push( RenderedRow::new() );

        let mut drag = DragController::new();
        assert!( !drag.drag_start( &mut container, 1 ) );
        assert!( !drag.drag_start( &mut container, 2 ) );
        assert!( !drag.drag_start( &mut container, 7 ) );

        drag.drag_enter( &mut container, 0 );
        assert!( !container.rows[ 0 ].drag_over );
    }


    #[test]
    fn test_drop_into_other_view_aborts() {
        let mut queue = queue( 3 );
        let mut playlist = ViewContainer::new( ViewId::BrowsePlaylistDetail, ViewMode::Table );
        for i in 0..5 {
            let mut row = RenderedRow::new();
            row.data.uri = Some( format!( "pl{}", i ) );
            row.data.pos = Some( i );
            playlist.rows.push( row );
        }
        let before = playlist.to_string();
        let mut drag = DragController::new();
        let mut moves = Moves::default();

        assert!( drag.drag_start( &mut queue, 0 ) );
        drag.drag_enter( &mut playlist, 4 );
        assert!( !playlist.rows[ 4 ].drag_over );

        assert_eq!( drag.drop( &mut playlist, 4, &mut moves ), DropOutcome::Aborted );
        assert!( moves.0.is_empty() );
        assert!( !drag.is_dragging() );
        assert!( !playlist.updating );
        assert_eq!( playlist.to_string(), before );

        // the session is gone, so a new drag can start
        assert!( drag.drag_start( &mut playlist, 1 ) );
    }


    #[test]
    fn test_drag_end_in_other_view_keeps_its_rows() {
        let mut queue = queue( 2 );
        let mut other = ViewContainer::new( ViewId::BrowsePlaylistDetail, ViewMode::Table );
        let mut row = RenderedRow::new();
        row.data.pos = Some( 0 );
        row.dimmed = true;
        other.rows.push( row );

        let mut drag = DragController::new();
        drag.drag_start( &mut queue, 1 );
        drag.drag_end( &mut other );

        assert!( !drag.is_dragging() );
        assert!( other.rows[ 0 ].dimmed );
    }


    #[test]
    fn test_refreshed_source_slot_is_not_hidden() {
        let mut container = queue( 3 );
        let mut drag = DragController::new();
        let mut moves = Moves::default();
        drag.drag_start( &mut container, 1 );

        // a refresh rebinds the dragged node to another entry
        let mut moved = RenderedRow::new();
        moved.data.uri = Some( "song9".to_string() );
        moved.data.pos = Some( 9 );
        container.rows[ 1 ].replace_with( moved );

        let outcome = drag.drop( &mut container, 2, &mut moves );
        assert_eq!( outcome, DropOutcome::Moved { from: 1, to: 2 } );
        assert!( !container.rows[ 1 ].hidden );
        assert_eq!( container.rows[ 1 ].data.uri.as_deref(), Some( "song9" ) );
    }
}

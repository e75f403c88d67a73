//! mpview CLI - terminal front-end for the list view engine

mod cli;
mod command;
mod handlers;
mod input;
mod settings;
mod transport;

use std::collections::HashMap;
use std::fs::{ self, File };
use std::io;
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::{ Duration, Instant };

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{ self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind },
    terminal::{ disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen },
    ExecutableCommand,
};
use ratatui::{
    layout::Position,
    prelude::*,
    widgets::{ Block, Borders, Clear, Paragraph, Wrap },
};
use tracing_subscriber::EnvFilter;

use cli::Args;
use command::Command;
use handlers::{ create_request_channel, handler_for, ViewRequest };
use input::{ CommandLine, InputMode };
use settings::Settings;
use transport::FileTransport;

use mpview_core::{
    reconcile_response,
    render::{ header_name, Cell },
    ActionTemplate, AlbumDividers, ContainerManager, Content, Dispatch, DropOutcome, EntryData, EntryType, Icon,
    Paging, RenderContext, RenderedRow, ReconcileOptions, RequestSequence, ResizeDebouncer, Response, ViewContainer,
    ViewEvent, ViewId, ViewMode,
};


/// Terminal width, in columns, below which tables stack their fields.
const NARROW_COLUMNS: u32 = 80;

const CARD_WIDTH: u16 = 26;
const CARD_HEIGHT: u16 = 6;


/// What a screen region maps to.
#[derive( Debug, Clone, PartialEq, Eq )]
enum Target {
    Header,
    Row( usize ),
    Action( usize, String ),
}


/// A clickable region recorded while drawing.
#[derive( Debug, Clone )]
struct Hit {
    area: Rect,
    target: Target,
}


/// Result of drawing the focused view.
struct Painted {
    hits: Vec<Hit>,
    scroll: usize,
}


/// Entry details shown over the view.
#[derive( Debug, Clone )]
struct Popup {
    title: String,
    lines: Vec<String>,
}


impl Popup {
    fn for_entry( view: ViewId, entry: &EntryData ) -> Self {
        let mut lines = Vec::new();
        if let Some( t ) = entry.entry_type {
            lines.push( format!( "Type: {}", Icon::for_type( Some( t ) ).title() ) );
        }
        if let Some( uri ) = &entry.uri {
            lines.push( format!( "URI: {}", uri ) );
        }
        if let Some( pos ) = entry.pos {
            lines.push( format!( "Position: {}", pos.saturating_add( 1 ) ) );
        }
        for ( key, value ) in &entry.extras {
            lines.push( format!( "{}: {}", key, value ) );
        }
        lines.push( String::new() );
        lines.push( "Actions:".to_string() );
        for link in ActionTemplate::for_view( view ).links().iter().filter( |l| l.action != "popover" ) {
            lines.push( format!( "  {} {}", action_glyph( &link.icon ), link.title ) );
        }

        Self {
            title: entry.name.clone().unwrap_or_else( || "Entry".to_string() ),
            lines,
        }
    }


    fn help() -> Self {
        Self {
            title: "Help".to_string(),
            lines: command::help_text().lines().map( str::to_string ).collect(),
        }
    }
}


/// Mouse press waiting to become a click or a drag.
#[derive( Debug, Clone, Copy )]
struct Press {
    ordinal: usize,
    ctrl: bool,
    shift: bool,
}


/// Application state.
struct App {
    settings: Settings,
    transport: FileTransport,
    manager: ContainerManager,
    sequence: RequestSequence,
    debouncer: ResizeDebouncer,
    requests_rx: mpsc::Receiver<ViewRequest>,
    should_quit: bool,

    // View state
    view: ViewId,
    layout: mpview_core::Layout,
    offsets: HashMap<ViewId, usize>,
    cursor: usize,
    scroll: usize,
    playing: Option<String>,
    popup: Option<Popup>,

    // Input state
    input_mode: InputMode,
    command_line: CommandLine,

    // Pointer state
    hits: Vec<Hit>,
    press: Option<Press>,
    hover: Option<usize>,

    // Status message (shown in status bar)
    status_message: Option<String>,
    status_clear_at: Option<Instant>,
}


impl App {
    /// Creates a new App instance.
    fn new( args: &Args, width: u16 ) -> Self {
        let mut settings = Settings::load();
        if let Some( mode ) = args.mode {
            let mut config = settings.view_config( args.view );
            config.mode = mode;
            settings.set_view_config( args.view, &config );
        }

        let ( tx, requests_rx ) = create_request_channel();
        let mut manager = ContainerManager::new();
        for view in ViewId::ALL {
            manager.register( view, handler_for( view, tx.clone() ) );
        }

        let layout = mpview_core::Layout::for_width( width as u32, settings.small_width_rows, NARROW_COLUMNS );
        tracing::info!( "Starting on {} with pages from {:?}", args.view, args.pages );

        let mut app = Self {
            settings,
            transport: FileTransport::new( args.pages.clone() ),
            manager,
            sequence: RequestSequence::new(),
            debouncer: ResizeDebouncer::default(),
            requests_rx,
            should_quit: false,
            view: args.view,
            layout,
            offsets: HashMap::new(),
            cursor: 0,
            scroll: 0,
            playing: None,
            popup: None,
            input_mode: InputMode::Normal,
            command_line: CommandLine::new(),
            hits: Vec::new(),
            press: None,
            hover: None,
            status_message: None,
            status_clear_at: None,
        };
        app.refresh( args.view );
        app
    }


    /// Sets a status message that auto-clears after a delay.
    fn set_status( &mut self, msg: impl Into<String> ) {
        self.status_message = Some( msg.into() );
        self.status_clear_at = Some( Instant::now() + Duration::from_secs( 3 ) );
    }


    /// Clears expired messages, applies pending resizes and handler requests.
    fn tick( &mut self ) {
        let now = Instant::now();
        if self.status_clear_at.is_some_and( |at| now >= at ) {
            self.status_message = None;
            self.status_clear_at = None;
        }

        if let Some( width ) = self.debouncer.poll( now ) {
            let layout = mpview_core::Layout::for_width( width, self.settings.small_width_rows, NARROW_COLUMNS );
            if layout != self.layout {
                tracing::debug!( "Layout changed to {:?} at width {}", layout, width );
                self.layout = layout;
                self.refresh( self.view );
            }
        }

        while let Ok( request ) = self.requests_rx.try_recv() {
            self.handle_request( request );
        }
    }


    /// Re-reads everything the view currently shows and reconciles it.
    ///
    /// With incremental paging that is one window from the top covering every
    /// page loaded so far.
    fn refresh( &mut self, view: ViewId ) {
        let offset = self.offsets.get( &view ).copied().unwrap_or( 0 );
        let max = self.settings.max_elements_per_page;
        match self.settings.paging() {
            Paging::Exhaustive => self.load( view, offset, max ),
            Paging::Incremental => self.load( view, 0, offset + max ),
        }
    }


    /// Fetches one window of a view and reconciles its container.
    fn load( &mut self, view: ViewId, offset: usize, limit: usize ) {
        let config = self.settings.view_config( view );
        self.manager.ensure_container( view, &config );
        if let Some( container ) = self.manager.container_mut( view ) {
            container.updating = true;
        }

        let seq = self.sequence.next( view );
        let response = match self.transport.fetch( view, offset, limit ) {
            Ok( response ) => response,
            Err( e ) => {
                tracing::warn!( "Fetching {} failed: {}", view, e );
                Response::err( e.to_string() )
            }
        };
        self.apply_response( view, seq, &response );
    }


    /// Reconciles a response unless a newer request for the view went out.
    fn apply_response( &mut self, view: ViewId, seq: u64, response: &Response ) {
        if !self.sequence.is_current( view, seq ) {
            tracing::debug!( "Discarding stale response {} for {}", seq, view );
            return;
        }

        let config = self.settings.view_config( view );
        let actions = ActionTemplate::for_view( view );
        let mut ctx = RenderContext::new( &config, &actions );
        ctx.layout = self.layout;

        let playing = self.playing.clone();
        let mut opts = ReconcileOptions::new()
            .with_paging( self.settings.paging() )
            .with_hook( move |row: &mut RenderedRow, record, _page| {
                row.playing = playing.is_some() && record.uri() == playing.as_deref();
                if let Some( id ) = record.u64( "id" ) {
                    row.data.extras.insert( "songid".to_string(), id.to_string() );
                }
            });
        match view {
            ViewId::BrowseDatabaseAlbumDetail => {
                opts = opts.with_dividers( AlbumDividers::new( self.settings.show_work ) );
            }
            ViewId::BrowseDatabaseTagList | ViewId::BrowseDatabaseAlbumList => {
                opts = opts.with_identity_tags( self.settings.registry.tag_list_album.clone() );
            }
            _ => {}
        }

        let container = match self.manager.try_container_mut( view ) {
            Ok( container ) => container,
            Err( e ) => {
                tracing::warn!( "Not applying response: {}", e );
                return;
            }
        };
        match reconcile_response( container, response, &ctx, &mut opts ) {
            Ok( _ ) => {
                let len = container.len();
                if view == self.view && self.cursor >= len {
                    self.cursor = len.saturating_sub( 1 );
                }
            }
            Err( e ) => {
                container.updating = false;
                if view == self.view {
                    self.set_status( format!( "{}: {}", view, e ) );
                }
            }
        }
    }


    /// Switches the focused view.
    fn open_view( &mut self, view: ViewId ) {
        self.manager.end_drag();
        self.press = None;
        if let Some( container ) = self.manager.container_mut( self.view ) {
            container.set_select_mode( false );
        }
        self.view = view;
        self.cursor = 0;
        self.scroll = 0;
        self.popup = None;
        self.refresh( view );
    }


    /// Changes the mode of the focused view and persists it.
    fn set_mode( &mut self, mode: ViewMode ) {
        let mut config = self.settings.view_config( self.view );
        config.mode = mode;
        self.settings.set_view_config( self.view, &config );
        self.save_settings();
        self.scroll = 0;
        self.refresh( self.view );
        self.set_status( format!( "{} mode", mode.name() ) );
    }


    fn save_settings( &mut self ) {
        if let Err( e ) = self.settings.save() {
            tracing::warn!( "Failed to save settings: {}", e );
            self.set_status( format!( "Settings not saved: {}", e ) );
        }
    }


    fn container( &self ) -> Option<&ViewContainer> {
        self.manager.container( self.view )
    }


    fn dispatch( &mut self, event: ViewEvent ) -> Dispatch {
        let result = self.manager.dispatch( self.view, event );
        if let Dispatch::Selection( count ) = result {
            self.set_status( format!( "{} selected", count ) );
        }
        result
    }


    fn handle_request( &mut self, request: ViewRequest ) {
        match request {
            ViewRequest::Activate { view, entry } => self.activate( view, &entry ),
            ViewRequest::ContextMenu { view, entry } => {
                self.popup = Some( Popup::for_entry( view, &entry ) );
            }
            ViewRequest::Action { view, action, entry } => match action.as_str() {
                "quickPlay" => self.play( view, &entry ),
                "quickRemove" => {
                    let Some( pos ) = entry.pos else {
                        return;
                    };
                    match self.transport.remove_entry( view, pos ) {
                        Ok(()) => self.set_status( format!( "Removed {}", entry.name.as_deref().unwrap_or( "entry" ) ) ),
                        Err( e ) => self.set_status( e.to_string() ),
                    }
                    self.refresh( view );
                }
                "showSongsByTag" => {
                    let value = entry.name.clone().unwrap_or_default();
                    self.open_view( ViewId::Search );
                    self.set_status( format!( "Songs tagged {}", value ) );
                }
                other => self.set_status( format!( "{} is not available here", other ) ),
            },
            ViewRequest::Move { view, from, to } => {
                match self.transport.move_entry( view, from, to ) {
                    Ok(()) => self.set_status( format!( "Moved {} to {}", from.saturating_add( 1 ), to.saturating_add( 1 ) ) ),
                    Err( e ) => self.set_status( e.to_string() ),
                }
                // the refresh also restores the optimistically hidden row
                self.refresh( view );
                if view == self.view {
                    self.cursor = to;
                }
            }
        }
    }


    /// Default activation: open containers, play everything else.
    fn activate( &mut self, view: ViewId, entry: &EntryData ) {
        let name = entry.name.clone().unwrap_or_default();
        match ( view, entry.entry_type ) {
            ( _, Some( EntryType::Album ) ) => {
                self.open_view( ViewId::BrowseDatabaseAlbumDetail );
                self.set_status( format!( "Album {}", name ) );
            }
            ( _, Some( EntryType::Plist | EntryType::Smartpls ) ) => {
                self.open_view( ViewId::BrowsePlaylistDetail );
                self.set_status( format!( "Playlist {}", name ) );
            }
            ( ViewId::BrowseDatabaseTagList, _ ) => {
                self.open_view( ViewId::BrowseDatabaseAlbumList );
                self.set_status( format!( "Albums for {}", name ) );
            }
            ( _, Some( EntryType::Dir ) ) => {
                self.set_status( format!( "Directory {}", entry.uri.as_deref().unwrap_or( "" ) ) );
            }
            _ => self.play( view, entry ),
        }
    }


    fn play( &mut self, view: ViewId, entry: &EntryData ) {
        self.playing = entry.uri.clone();
        self.set_status( format!( "Playing {}", entry.name.as_deref().unwrap_or( "" ) ) );
        self.refresh( view );
    }


    /// Handles keyboard input.
    fn handle_key( &mut self, code: KeyCode, modifiers: KeyModifiers ) {
        match self.input_mode {
            InputMode::Normal => self.handle_normal_key( code, modifiers ),
            InputMode::Command => self.handle_command_key( code ),
        }
    }


    fn handle_normal_key( &mut self, code: KeyCode, modifiers: KeyModifiers ) {
        if self.popup.is_some() {
            if matches!( code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char( 'q' ) | KeyCode::Char( '?' ) ) {
                self.popup = None;
            }
            return;
        }

        let len = self.container().map( ViewContainer::len ).unwrap_or( 0 );
        match code {
            KeyCode::Char( 'q' ) => self.should_quit = true,
            KeyCode::Char( '/' ) => {
                self.input_mode = InputMode::Command;
                self.command_line.clear();
            }
            KeyCode::Char( '?' ) => self.popup = Some( Popup::help() ),
            KeyCode::Tab => self.open_view( self.view.next() ),
            KeyCode::BackTab => self.open_view( self.view.prev() ),

            KeyCode::Down | KeyCode::Char( 'j' ) => {
                self.cursor = ( self.cursor + 1 ).min( len.saturating_sub( 1 ) );
            }
            KeyCode::Up | KeyCode::Char( 'k' ) => self.cursor = self.cursor.saturating_sub( 1 ),
            KeyCode::Home | KeyCode::Char( 'g' ) => self.cursor = 0,
            KeyCode::End | KeyCode::Char( 'G' ) => self.cursor = len.saturating_sub( 1 ),

            KeyCode::Enter => {
                self.dispatch( ViewEvent::Click { ordinal: self.cursor, ctrl: false, shift: false } );
            }
            KeyCode::Char( ' ' ) => {
                self.dispatch( ViewEvent::Click { ordinal: self.cursor, ctrl: true, shift: false } );
            }
            KeyCode::Char( 'v' ) => {
                self.dispatch( ViewEvent::Click { ordinal: self.cursor, ctrl: true, shift: true } );
            }
            KeyCode::Char( 's' ) => self.toggle_select_mode(),
            KeyCode::Char( 'a' ) => {
                if self.dispatch( ViewEvent::HeaderClick ) == Dispatch::Ignored {
                    self.set_status( "Select mode is off" );
                }
            }
            KeyCode::Esc => {
                if let Some( container ) = self.manager.container_mut( self.view ) {
                    container.set_select_mode( false );
                }
            }

            KeyCode::Char( '.' ) => {
                self.dispatch( ViewEvent::ActionClick { ordinal: self.cursor, action: "popover".to_string() } );
            }
            KeyCode::Char( 'x' ) => {
                let action = self.container()
                    .and_then( |c| c.row( self.cursor ) )
                    .and_then( |r| r.actions.iter().find( |a| a.action != "popover" ) )
                    .map( |a| a.action.clone() );
                if let Some( action ) = action {
                    self.dispatch( ViewEvent::ActionClick { ordinal: self.cursor, action } );
                }
            }

            KeyCode::Char( 'J' ) => self.move_row( 1 ),
            KeyCode::Char( 'K' ) => self.move_row( -1 ),

            KeyCode::Char( 'm' ) => {
                let mode = self.settings.view_config( self.view ).mode.next();
                self.set_mode( mode );
            }
            KeyCode::Char( 'n' ) => self.next_page(),
            KeyCode::Char( 'p' ) => self.prev_page(),
            KeyCode::Char( 'r' ) if modifiers.is_empty() => self.reload(),
            _ => {}
        }
    }


    fn handle_command_key( &mut self, code: KeyCode ) {
        match code {
            KeyCode::Enter => {
                let input = self.command_line.submit();
                self.input_mode = InputMode::Normal;
                self.execute_command( &input );
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.command_line.clear();
            }
            KeyCode::Backspace => {
                if self.command_line.is_empty() {
                    self.input_mode = InputMode::Normal;
                } else {
                    self.command_line.backspace();
                }
            }
            KeyCode::Tab => {
                let candidates = self.completions();
                let matches = self.command_line.complete( &candidates );
                if matches.len() > 1 {
                    let shown = matches.join( " " );
                    self.set_status( shown );
                }
            }
            KeyCode::Up => self.command_line.history_prev(),
            KeyCode::Down => self.command_line.history_next(),
            KeyCode::Left => self.command_line.move_left(),
            KeyCode::Right => self.command_line.move_right(),
            KeyCode::Char( c ) => self.command_line.insert( c ),
            _ => {}
        }
    }


    /// Candidates for Tab completion, chosen by the command word.
    fn completions( &self ) -> Vec<String> {
        let line = self.command_line.content();
        let config = self.settings.view_config( self.view );
        match line.split_once( ' ' ).map( |( cmd, _ )| cmd ) {
            Some( "view" | "v" ) => ViewId::ALL.iter().map( |v| v.name().to_string() ).collect(),
            Some( "mode" | "m" ) => [ "table", "grid", "list" ].iter().map( |s| s.to_string() ).collect(),
            Some( "add" | "a" ) => self.settings.registry.available_fields( self.view, &config ),
            Some( "remove" | "rm" | "up" | "down" ) => config.fields,
            _ => [ "view", "mode", "next", "prev", "reload", "fields", "add", "rm", "up", "down", "select", "all", "help", "quit" ]
                .iter()
                .map( |s| s.to_string() )
                .collect(),
        }
    }


    fn execute_command( &mut self, input: &str ) {
        match Command::parse( input ) {
            Ok( cmd ) => self.run_command( cmd ),
            Err( e ) => self.set_status( format!( "{}", e ) ),
        }
    }


    fn run_command( &mut self, cmd: Command ) {
        match cmd {
            Command::View { view } => self.open_view( view ),
            Command::Mode { mode } => {
                let mode = mode.unwrap_or_else( || self.settings.view_config( self.view ).mode.next() );
                self.set_mode( mode );
            }
            Command::NextPage => self.next_page(),
            Command::PrevPage => self.prev_page(),
            Command::Reload => self.reload(),

            Command::Fields => {
                let config = self.settings.view_config( self.view );
                let available = self.settings.registry.available_fields( self.view, &config );
                self.popup = Some( Popup {
                    title: format!( "Fields of {}", self.view ),
                    lines: vec![
                        format!( "Shown: {}", config.fields.join( ", " ) ),
                        String::new(),
                        format!( "Available: {}", available.join( ", " ) ),
                    ],
                });
            }
            Command::AddField { field } => self.edit_fields( &field, |config, name| config.add_field( name ) ),
            Command::RemoveField { field } => self.edit_fields( &field, |config, name| config.remove_field( name ) ),
            Command::FieldUp { field } => self.edit_fields( &field, |config, name| config.move_field_up( name ) ),
            Command::FieldDown { field } => self.edit_fields( &field, |config, name| config.move_field_down( name ) ),

            Command::Select => self.toggle_select_mode(),
            Command::All => {
                self.dispatch( ViewEvent::HeaderClick );
            }
            Command::Help => self.popup = Some( Popup::help() ),
            Command::Quit => self.should_quit = true,
        }
    }


    /// Applies a field edit to the focused view, matching the field name
    /// case-insensitively against the legal set.
    fn edit_fields( &mut self, field: &str, edit: impl FnOnce( &mut mpview_core::ViewConfig, &str ) -> bool ) {
        let legal = self.settings.registry.legal_fields( self.view );
        let Some( name ) = legal.iter().find( |f| f.eq_ignore_ascii_case( field ) ).cloned() else {
            self.set_status( format!( "{} is not a field of {}", field, self.view ) );
            return;
        };

        let mut config = self.settings.view_config( self.view );
        if !edit( &mut config, &name ) {
            self.set_status( format!( "{} unchanged", name ) );
            return;
        }
        self.settings.set_view_config( self.view, &config );
        self.save_settings();
        self.refresh( self.view );
        self.set_status( format!( "Fields: {}", self.settings.view_config( self.view ).fields.join( ", " ) ) );
    }


    fn toggle_select_mode( &mut self ) {
        let Some( container ) = self.manager.container_mut( self.view ) else {
            return;
        };
        let on = !container.select_mode;
        container.set_select_mode( on );
        self.set_status( if on { "Select mode" } else { "Select mode off" } );
    }


    /// Moves the row under the cursor by one through the drag controller.
    fn move_row( &mut self, delta: isize ) {
        let target = self.cursor as isize + delta;
        let len = self.container().map( ViewContainer::len ).unwrap_or( 0 ) as isize;
        if target < 0 || target >= len {
            return;
        }
        if self.dispatch( ViewEvent::DragStart { ordinal: self.cursor } ) != Dispatch::Dragging {
            self.set_status( format!( "{} cannot be reordered", self.view ) );
            return;
        }
        if let Dispatch::Dropped( DropOutcome::Aborted ) = self.dispatch( ViewEvent::Drop { ordinal: target as usize } ) {
            self.set_status( "Nothing moved" );
        }
    }


    fn next_page( &mut self ) {
        let has_next = self.container()
            .and_then( |c| c.pagination )
            .is_some_and( |p| p.has_next() );
        if !has_next {
            self.set_status( "Last page" );
            return;
        }
        let limit = self.settings.max_elements_per_page;
        let offset = self.offsets.entry( self.view ).or_insert( 0 );
        *offset += limit;
        let offset = *offset;
        match self.settings.paging() {
            Paging::Exhaustive => {
                self.cursor = 0;
                self.scroll = 0;
                self.refresh( self.view );
            }
            // the reconciler appends pages past the first
            Paging::Incremental => self.load( self.view, offset, limit ),
        }
    }


    fn prev_page( &mut self ) {
        if !self.settings.exhaustive_paging {
            return;
        }
        let limit = self.settings.max_elements_per_page;
        let offset = self.offsets.entry( self.view ).or_insert( 0 );
        if *offset == 0 {
            return;
        }
        *offset = offset.saturating_sub( limit );
        self.cursor = 0;
        self.scroll = 0;
        self.refresh( self.view );
    }


    fn reload( &mut self ) {
        self.transport.reload();
        self.offsets.remove( &self.view );
        self.refresh( self.view );
        self.set_status( format!( "Reloaded {}", self.view ) );
    }


    fn hit( &self, column: u16, row: u16 ) -> Option<&Target> {
        let pos = Position::new( column, row );
        // action regions sit on top of their row
        self.hits
            .iter()
            .rev()
            .find( |h| h.area.contains( pos ) )
            .map( |h| &h.target )
    }


    /// Handles mouse events: clicks, drags and the context menu.
    fn handle_mouse( &mut self, mouse: MouseEvent ) {
        if self.popup.is_some() {
            if let MouseEventKind::Down( _ ) = mouse.kind {
                self.popup = None;
            }
            return;
        }
        let target = self.hit( mouse.column, mouse.row ).cloned();
        let ctrl = mouse.modifiers.contains( KeyModifiers::CONTROL );
        let shift = mouse.modifiers.contains( KeyModifiers::SHIFT );

        match mouse.kind {
            MouseEventKind::Down( MouseButton::Left ) => match target {
                Some( Target::Header ) => {
                    self.dispatch( ViewEvent::HeaderClick );
                }
                Some( Target::Action( ordinal, action ) ) => {
                    self.cursor = ordinal;
                    self.dispatch( ViewEvent::ActionClick { ordinal, action } );
                }
                Some( Target::Row( ordinal ) ) => {
                    self.cursor = ordinal;
                    self.press = Some( Press { ordinal, ctrl, shift } );
                }
                None => {}
            },

            MouseEventKind::Drag( MouseButton::Left ) => {
                let Some( press ) = self.press else {
                    return;
                };
                if !self.manager.drag().is_dragging()
                    && self.dispatch( ViewEvent::DragStart { ordinal: press.ordinal } ) != Dispatch::Dragging
                {
                    return;
                }
                let over = match target {
                    Some( Target::Row( o ) | Target::Action( o, _ ) ) => Some( o ),
                    _ => None,
                };
                if over != self.hover {
                    if let Some( left ) = self.hover {
                        self.dispatch( ViewEvent::DragLeave { ordinal: left } );
                    }
                    if let Some( entered ) = over {
                        self.dispatch( ViewEvent::DragEnter { ordinal: entered } );
                    }
                    self.hover = over;
                }
            }

            MouseEventKind::Up( MouseButton::Left ) => {
                let press = self.press.take();
                self.hover = None;
                if self.manager.drag().is_dragging() {
                    let result = match target {
                        Some( Target::Row( ordinal ) | Target::Action( ordinal, _ ) ) => {
                            self.dispatch( ViewEvent::Drop { ordinal } )
                        }
                        _ => self.dispatch( ViewEvent::DragEnd ),
                    };
                    if let Dispatch::Dropped( DropOutcome::Moved { .. } ) = result {
                        tracing::debug!( "Drop accepted on {}", self.view );
                    }
                    return;
                }
                if let ( Some( press ), Some( Target::Row( ordinal ) ) ) = ( press, target ) {
                    if press.ordinal == ordinal {
                        self.dispatch( ViewEvent::Click { ordinal, ctrl: press.ctrl, shift: press.shift } );
                    }
                }
            }

            MouseEventKind::Down( MouseButton::Right ) => {
                if let Some( Target::Row( ordinal ) | Target::Action( ordinal, _ ) ) = target {
                    self.cursor = ordinal;
                    self.dispatch( ViewEvent::ContextMenu { ordinal } );
                }
            }

            MouseEventKind::ScrollDown => {
                let len = self.container().map( ViewContainer::len ).unwrap_or( 0 );
                self.cursor = ( self.cursor + 1 ).min( len.saturating_sub( 1 ) );
            }
            MouseEventKind::ScrollUp => self.cursor = self.cursor.saturating_sub( 1 ),
            _ => {}
        }
    }
}


/// Installs a file logger; a TUI owns stdout.
fn init_logging( level: Option<&str> ) -> Result<()> {
    let Some( dir ) = dirs::data_dir().map( |d| d.join( "mpview" ) ) else {
        return Ok(());
    };
    fs::create_dir_all( &dir )?;
    let file = File::create( dir.join( "mpview.log" ) )?;

    let filter = match level {
        Some( level ) => EnvFilter::try_new( level )?,
        None => EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new( "info" ) ),
    };
    tracing_subscriber::fmt()
        .with_env_filter( filter )
        .with_writer( Mutex::new( file ) )
        .with_ansi( false )
        .init();
    Ok(())
}


fn main() -> Result<()> {
    let args = Args::parse();
    init_logging( args.log_level.as_deref() )?;

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute( EnterAlternateScreen )?;
    io::stdout().execute( crossterm::event::EnableMouseCapture )?;

    let mut terminal = Terminal::new( CrosstermBackend::new( io::stdout() ) )?;
    let ( width, _ ) = crossterm::terminal::size()?;

    let mut app = App::new( &args, width );

    // Main loop
    loop {
        app.tick();

        terminal.draw( |frame| draw_ui( frame, &mut app ) )?;

        if event::poll( Duration::from_millis( 100 ) )? {
            match event::read()? {
                Event::Key( key ) if key.kind == KeyEventKind::Press => {
                    app.handle_key( key.code, key.modifiers );
                }
                Event::Mouse( mouse ) => app.handle_mouse( mouse ),
                Event::Resize( width, _ ) => app.debouncer.resized( width as u32, Instant::now() ),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Cleanup
    io::stdout().execute( crossterm::event::DisableMouseCapture )?;
    disable_raw_mode()?;
    io::stdout().execute( LeaveAlternateScreen )?;

    Ok(())
}


/// Draws the main UI.
fn draw_ui( frame: &mut Frame, app: &mut App ) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction( Direction::Vertical )
        .constraints([
            Constraint::Length( 2 ),  // Header
            Constraint::Min( 0 ),     // View
            Constraint::Length( 1 ),  // Pagination
            Constraint::Length( 1 ),  // Status bar
        ])
        .split( area );

    let header = Paragraph::new( format!( "  MPVIEW - {}", app.view ) )
        .style( Style::default().fg( Color::Cyan ).bold() )
        .block( Block::default().borders( Borders::BOTTOM ) );
    frame.render_widget( header, chunks[0] );

    let painted = match app.container() {
        Some( container ) => draw_view( frame, app, container, chunks[1] ),
        None => Painted { hits: Vec::new(), scroll: 0 },
    };
    app.hits = painted.hits;
    app.scroll = painted.scroll;

    draw_pagination( frame, app, chunks[2] );
    draw_status_bar( frame, app, chunks[3] );

    if let Some( popup ) = &app.popup {
        draw_popup( frame, popup, area );
    }
}


fn draw_view( frame: &mut Frame, app: &App, container: &ViewContainer, area: Rect ) -> Painted {
    let mut title = format!( " {} [{}] ", container.list_id(), container.shape().name() );
    if container.select_mode {
        title.push_str( &format!( "[select: {}] ", container.selected_count() ) );
    }
    if container.updating {
        title.push_str( "[updating] " );
    }
    if container.listeners().drag {
        title.push_str( "[J/K reorder] " );
    }

    let block = Block::default().title( title ).borders( Borders::ALL );
    let inner = block.inner( area );
    frame.render_widget( block, area );

    match container.shape() {
        ViewMode::Table => draw_table( frame, app, container, inner ),
        ViewMode::Grid => draw_grid( frame, app, container, inner ),
        ViewMode::List => draw_list( frame, app, container, inner ),
    }
}


/// Height a row takes in table and list shapes.
fn row_height( row: &RenderedRow ) -> u16 {
    if row.hidden {
        return 0;
    }
    match &row.content {
        Content::Stacked( cells ) => cells.len().max( 1 ) as u16,
        Content::Card { body, .. } if body.len() > 1 => 2,
        _ => 1,
    }
}


/// Picks the first visible ordinal so the cursor row fits in `height` lines.
fn scroll_to_cursor( rows: &[RenderedRow], cursor: usize, scroll: usize, height: u16 ) -> usize {
    let cursor = cursor.min( rows.len().saturating_sub( 1 ) );
    let mut scroll = scroll.min( cursor );
    while scroll < cursor {
        let used: u16 = rows[ scroll..=cursor ]
            .iter()
            .map( row_height )
            .sum();
        if used <= height {
            break;
        }
        scroll += 1;
    }
    scroll
}


fn row_style( app: &App, row: &RenderedRow, ordinal: usize ) -> Style {
    let mut style = Style::default();
    if row.not_clickable {
        style = style.fg( Color::Cyan ).italic();
    }
    if row.playing {
        style = style.fg( Color::Green ).bold();
    }
    if row.dimmed {
        style = style.fg( Color::DarkGray );
    }
    if row.drag_over {
        style = style.underlined();
    }
    if ordinal == app.cursor {
        style = style.bg( Color::DarkGray );
    }
    style
}


fn marker( container: &ViewContainer, row: &RenderedRow ) -> &'static str {
    if container.select_mode && !row.not_clickable {
        if row.selected { "[x] " } else { "[ ] " }
    } else if row.playing {
        " "
    } else {
        "  "
    }
}


fn action_glyph( icon: &str ) -> &'static str {
    match icon {
        "more_vert" => "⋮",
        "play_arrow" => "▶",
        "remove" => "✕",
        "manage_search" => "⌕",
        _ => "•",
    }
}


fn cell_text( cell: &Cell ) -> String {
    cell.value.text().replace( '\n', " / " )
}


/// Pads or truncates to exactly `width` characters.
fn fit( text: &str, width: usize ) -> String {
    let count = text.chars().count();
    if count > width {
        let mut s: String = text.chars().take( width.saturating_sub( 1 ) ).collect();
        s.push( '…' );
        s
    } else {
        format!( "{}{}", text, " ".repeat( width - count ) )
    }
}


/// Records one clickable region per action link at the right edge of a row.
fn action_hits( row: &RenderedRow, ordinal: usize, area: Rect, hits: &mut Vec<Hit> ) -> String {
    let mut text = String::new();
    let width = ( row.actions.len() * 2 ) as u16;
    let mut x = area.right().saturating_sub( width );
    for action in &row.actions {
        text.push_str( action_glyph( &action.icon ) );
        text.push( ' ' );
        hits.push( Hit {
            area: Rect::new( x, area.y, 1, 1 ),
            target: Target::Action( ordinal, action.action.clone() ),
        });
        x += 2;
    }
    text
}


fn draw_table( frame: &mut Frame, app: &App, container: &ViewContainer, area: Rect ) -> Painted {
    let config = app.settings.view_config( container.view() );
    let mut hits = Vec::new();
    let mut lines = Vec::new();
    if area.height < 2 {
        return Painted { hits, scroll: app.scroll };
    }

    let action_width = container.rows.first().map( |r| r.actions.len() * 2 ).unwrap_or( 4 );
    let avail = ( area.width as usize ).saturating_sub( 4 + action_width );
    let col_width = if config.fields.is_empty() { avail } else { avail / config.fields.len() };

    let mut header = String::from( if container.select_mode { "[ ] " } else { "    " } );
    for field in &config.fields {
        header.push_str( &fit( header_name( field ), col_width ) );
    }
    lines.push( Line::from( header ).style( Style::default().bold() ) );
    hits.push( Hit { area: Rect::new( area.x, area.y, area.width, 1 ), target: Target::Header } );

    let body_height = area.height - 1;
    let scroll = scroll_to_cursor( &container.rows, app.cursor, app.scroll, body_height );
    let mut y = area.y + 1;

    for ( ordinal, row ) in container.rows.iter().enumerate().skip( scroll ) {
        let height = row_height( row );
        if height == 0 {
            continue;
        }
        if y + height > area.y + area.height {
            break;
        }
        let row_area = Rect::new( area.x, y, area.width, height );
        hits.push( Hit { area: row_area, target: Target::Row( ordinal ) } );
        let style = row_style( app, row, ordinal );
        let prefix = marker( container, row );

        match &row.content {
            Content::Columns( cells ) | Content::Custom( cells ) => {
                let mut text = String::from( prefix );
                for cell in cells {
                    text.push_str( &fit( &cell_text( cell ), col_width ) );
                }
                let text = fit( &text, avail + 4 );
                let actions = action_hits( row, ordinal, row_area, &mut hits );
                lines.push( Line::from( format!( "{}{}", text, actions ) ).style( style ) );
            }
            Content::Stacked( cells ) => {
                let actions = action_hits( row, ordinal, row_area, &mut hits );
                for ( i, cell ) in cells.iter().enumerate() {
                    let label = cell.label.as_deref().unwrap_or( "" );
                    let text = if label.is_empty() {
                        cell_text( cell )
                    } else {
                        format!( "{}: {}", label, cell_text( cell ) )
                    };
                    let lead = if i == 0 { prefix } else { "    " };
                    let mut line = fit( &format!( "{}{}", lead, text ), avail + 4 );
                    if i == 0 {
                        line.push_str( &actions );
                    }
                    lines.push( Line::from( line ).style( style ) );
                }
            }
            other => lines.push( Line::from( format!( "{}{}", prefix, content_line( other ) ) ).style( style ) ),
        }
        y += height;
    }

    frame.render_widget( Paragraph::new( lines ), area );
    Painted { hits, scroll }
}


fn draw_list( frame: &mut Frame, app: &App, container: &ViewContainer, area: Rect ) -> Painted {
    let mut hits = Vec::new();
    let mut lines = Vec::new();
    let scroll = scroll_to_cursor( &container.rows, app.cursor, app.scroll, area.height );
    let mut y = area.y;

    for ( ordinal, row ) in container.rows.iter().enumerate().skip( scroll ) {
        let height = row_height( row );
        if height == 0 {
            continue;
        }
        if y + height > area.y + area.height {
            break;
        }
        let row_area = Rect::new( area.x, y, area.width, height );
        hits.push( Hit { area: row_area, target: Target::Row( ordinal ) } );
        let style = row_style( app, row, ordinal );
        let prefix = marker( container, row );
        let width = ( area.width as usize ).saturating_sub( row.actions.len() * 2 );

        match &row.content {
            Content::Card { image, body } => {
                let title = body.first().map( cell_text ).unwrap_or_default();
                let thumb = if image.is_some() { "▣ " } else { "" };
                let actions = action_hits( row, ordinal, row_area, &mut hits );
                let first = fit( &format!( "{}{}{}", prefix, thumb, title ), width );
                lines.push( Line::from( format!( "{}{}", first, actions ) ).style( style.bold() ) );
                if body.len() > 1 {
                    let details: Vec<String> = body[ 1.. ]
                        .iter()
                        .map( |c| match &c.label {
                            Some( label ) => format!( "{}: {}", label, cell_text( c ) ),
                            None => cell_text( c ),
                        })
                        .collect();
                    lines.push( Line::from( fit( &format!( "    {}", details.join( "  " ) ), width ) ).style( style ) );
                }
            }
            other => lines.push( Line::from( format!( "{}{}", prefix, content_line( other ) ) ).style( style ) ),
        }
        y += height;
    }

    frame.render_widget( Paragraph::new( lines ), area );
    Painted { hits, scroll }
}


fn draw_grid( frame: &mut Frame, app: &App, container: &ViewContainer, area: Rect ) -> Painted {
    let mut hits = Vec::new();
    let cols = ( area.width / CARD_WIDTH ).max( 1 ) as usize;
    let visible_rows = ( area.height / CARD_HEIGHT ).max( 1 ) as usize;

    let visible: Vec<( usize, &RenderedRow )> = container.rows
        .iter()
        .enumerate()
        .filter( |( _, r )| !r.hidden )
        .collect();
    let cursor_slot = visible.iter().position( |( o, _ )| *o == app.cursor ).unwrap_or( 0 );
    let mut first_line = app.scroll / cols;
    let cursor_line = cursor_slot / cols;
    if cursor_line < first_line {
        first_line = cursor_line;
    } else if cursor_line >= first_line + visible_rows {
        first_line = cursor_line + 1 - visible_rows;
    }

    for ( slot, ( ordinal, row ) ) in visible.iter().enumerate().skip( first_line * cols ).take( cols * visible_rows ) {
        let line = slot / cols - first_line;
        let col = slot % cols;
        let card_area = Rect::new(
            area.x + col as u16 * CARD_WIDTH,
            area.y + line as u16 * CARD_HEIGHT,
            CARD_WIDTH.min( area.width ),
            CARD_HEIGHT.min( area.height ),
        );
        hits.push( Hit { area: card_area, target: Target::Row( *ordinal ) } );

        let style = row_style( app, row, *ordinal );
        let inner_width = CARD_WIDTH.saturating_sub( 2 ) as usize;
        let ( title, body_lines ) = match &row.content {
            Content::Card { image, body } => {
                let mut lines = Vec::new();
                lines.push( Line::from( if image.is_some() { "▣ cover" } else { "" } ).style( Style::default().fg( Color::DarkGray ) ) );
                for cell in body.iter().skip( 1 ) {
                    lines.push( Line::from( fit( &cell_text( cell ), inner_width ) ) );
                }
                ( body.first().map( cell_text ).unwrap_or_default(), lines )
            }
            other => ( content_line( other ), Vec::new() ),
        };

        let action_area = Rect::new( card_area.x + 1, card_area.bottom().saturating_sub( 1 ), card_area.width.saturating_sub( 2 ), 1 );
        let actions = action_hits( row, *ordinal, action_area, &mut hits );
        let card = Paragraph::new( body_lines )
            .block(
                Block::default()
                    .borders( Borders::ALL )
                    .title( fit( &format!( "{}{}", marker( container, row ).trim_end(), title ), inner_width ) )
                    .title_bottom( Line::from( actions ).right_aligned() )
                    .border_style( style )
            );
        frame.render_widget( card, card_area );
    }

    Painted { hits, scroll: first_line * cols }
}


/// One-line text of content the shape has no special layout for.
fn content_line( content: &Content ) -> String {
    match content {
        Content::Empty => String::new(),
        Content::Divider { icon, text } => format!( "── {} {} ──", icon.glyph(), text ),
        Content::Columns( cells ) | Content::Stacked( cells ) | Content::Custom( cells ) => {
            cells.iter().map( cell_text ).collect::<Vec<_>>().join( "  " )
        }
        Content::Card { body, .. } => body.iter().map( cell_text ).collect::<Vec<_>>().join( "  " ),
    }
}


fn draw_pagination( frame: &mut Frame, app: &App, area: Rect ) {
    let Some( pagination ) = app.container().and_then( |c| c.pagination ) else {
        return;
    };
    let first = if pagination.returned == 0 { 0 } else { pagination.offset + 1 };
    let text = format!(
        " {}-{} of {}{}{}",
        first,
        pagination.offset + pagination.returned,
        pagination.label( app.settings.max_elements_per_page ),
        if pagination.has_next() { "  [n]ext" } else { "" },
        if pagination.offset > 0 && app.settings.exhaustive_paging { "  [p]rev" } else { "" },
    );
    frame.render_widget( Paragraph::new( text ).style( Style::default().fg( Color::DarkGray ) ), area );
}


fn draw_popup( frame: &mut Frame, popup: &Popup, area: Rect ) {
    let width = area.width.saturating_sub( 8 ).min( 72 );
    let height = ( popup.lines.len() as u16 + 2 ).min( area.height.saturating_sub( 2 ) );
    let rect = Rect::new(
        area.x + ( area.width.saturating_sub( width ) ) / 2,
        area.y + ( area.height.saturating_sub( height ) ) / 2,
        width,
        height,
    );

    let lines: Vec<Line> = popup.lines.iter().map( |l| Line::from( l.as_str() ) ).collect();
    let widget = Paragraph::new( lines )
        .block(
            Block::default()
                .title( format!( " {} (Esc to close) ", popup.title ) )
                .borders( Borders::ALL )
                .border_style( Style::default().fg( Color::Cyan ) )
        )
        .wrap( Wrap { trim: false } );
    frame.render_widget( Clear, rect );
    frame.render_widget( widget, rect );
}


fn draw_status_bar( frame: &mut Frame, app: &App, area: Rect ) {
    let ( text, style ) = match app.input_mode {
        InputMode::Command => {
            ( format!( "/{}", app.command_line.content() ), Style::default().fg( Color::Yellow ) )
        }
        InputMode::Normal => {
            if let Some( ref msg ) = app.status_message {
                ( msg.clone(), Style::default().fg( Color::Green ) )
            } else {
                let hint = " [/]Cmd [Tab]Views [m]Mode [Enter]Open [.]Menu [s]Select [n/p]Page [?]Help [q]Quit ";
                ( hint.to_string(), Style::default().fg( Color::DarkGray ) )
            }
        }
    };

    frame.render_widget( Paragraph::new( text ).style( style ), area );

    if app.input_mode == InputMode::Command {
        let cursor_x = area.x + 1 + app.command_line.cursor() as u16;
        frame.set_cursor_position(( cursor_x, area.y ));
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use mpview_core::render::Cell;
    use mpview_core::Fragment;


    fn stacked( n: usize ) -> RenderedRow {
        let mut row = RenderedRow::new();
        row.content = Content::Stacked(
            ( 0..n ).map( |i| Cell { col: format!( "f{}", i ), label: None, value: Fragment::text_of( "x" ) } ).collect()
        );
        row
    }


    #[test]
    fn test_fit() {
        assert_eq!( fit( "abc", 5 ), "abc  " );
        assert_eq!( fit( "abcdef", 4 ), "abc…" );
    }


    #[test]
    fn test_hidden_rows_take_no_space() {
        let mut row = stacked( 3 );
        assert_eq!( row_height( &row ), 3 );
        row.hidden = true;
        assert_eq!( row_height( &row ), 0 );
    }


    #[test]
    fn test_scroll_keeps_cursor_visible() {
        let rows: Vec<RenderedRow> = ( 0..10 ).map( |_| stacked( 2 ) ).collect();
        // 4 lines fit two rows
        assert_eq!( scroll_to_cursor( &rows, 5, 0, 4 ), 4 );
        assert_eq!( scroll_to_cursor( &rows, 1, 4, 4 ), 1 );
        assert_eq!( scroll_to_cursor( &rows, 1, 0, 4 ), 0 );
    }


    #[test]
    fn test_divider_line() {
        let content = Content::Divider { icon: mpview_core::Icon::for_type( Some( EntryType::Disc ) ), text: "Disc 2".to_string() };
        assert!( content_line( &content ).contains( "Disc 2" ) );
    }
}

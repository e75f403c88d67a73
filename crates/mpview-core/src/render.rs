//! Row and card rendering
//!
//! Builds one row's content from the active field list: columns for tables,
//! stacked label/value pairs on narrow viewports, and card bodies for the
//! grid and list shapes. The trailing action links always come from a
//! view-specific template.

use std::fmt;

use crate::format::{ complete_record, format_value, Fragment, Icon };
use crate::page::Record;
use crate::row::RenderedRow;
use crate::view::{ ViewConfig, ViewId, ViewMode };


/// Viewport width below which tables stack their fields.
pub const SMALL_WIDTH_BREAKPOINT: u32 = 576;


/// How table rows lay out their fields.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum Layout {
    /// One cell per field.
    #[default]
    Columns,

    /// One block of label/value pairs.
    Stacked,
}


impl Layout {
    /// Picks the layout for a viewport width.
    ///
    /// @param width - Viewport width
    /// @param small_width_rows - Whether narrow viewports stack their fields
    /// @param breakpoint - Width below which the viewport counts as narrow
    pub fn for_width( width: u32, small_width_rows: bool, breakpoint: u32 ) -> Self {
        if small_width_rows && width < breakpoint {
            Layout::Stacked
        } else {
            Layout::Columns
        }
    }
}


/// One rendered field.
#[derive( Debug, Clone, PartialEq )]
pub struct Cell {
    /// Field name the cell shows.
    pub col: String,

    /// Translated label, set for stacked and list layouts.
    pub label: Option<String>,

    pub value: Fragment,
}


/// Rendered content of a row.
#[derive( Debug, Clone, PartialEq, Default )]
pub enum Content {
    #[default]
    Empty,

    /// Table row with one cell per field.
    Columns( Vec<Cell> ),

    /// Table row on a narrow viewport.
    Stacked( Vec<Cell> ),

    /// Grid card or list item; the first body cell is the title.
    Card {
        image: Option<String>,
        body: Vec<Cell>,
    },

    /// Disc or work separator spanning the row.
    Divider {
        icon: Icon,
        text: String,
    },

    /// Content written by a custom row builder.
    Custom( Vec<Cell> ),
}


impl fmt::Display for Content {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        let write_cells = |f: &mut fmt::Formatter<'_>, cells: &[Cell]| -> fmt::Result {
            for cell in cells {
                match &cell.label {
                    Some( label ) => write!( f, " {}:{}={}", cell.col, label, cell.value )?,
                    None => write!( f, " {}={}", cell.col, cell.value )?,
                }
            }
            Ok(())
        };
        match self {
            Content::Empty => f.write_str( "empty" ),
            Content::Columns( cells ) => {
                f.write_str( "columns" )?;
                write_cells( f, cells )
            }
            Content::Stacked( cells ) => {
                f.write_str( "stacked" )?;
                write_cells( f, cells )
            }
            Content::Card { image, body } => {
                write!( f, "card img={}", image.as_deref().unwrap_or( "-" ) )?;
                write_cells( f, body )
            }
            Content::Divider { icon, text } => write!( f, "divider {} {}", icon.ligature(), text ),
            Content::Custom( cells ) => {
                f.write_str( "custom" )?;
                write_cells( f, cells )
            }
        }
    }
}


/// One link of the action cell.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct ActionLink {
    /// Action dispatched on click (`popover`, `quickPlay`, `quickRemove`, ...).
    pub action: String,

    /// Icon ligature.
    pub icon: String,

    pub title: String,
}


impl ActionLink {
    pub fn new( action: &str, icon: &str, title: &str ) -> Self {
        Self {
            action: action.to_string(),
            icon: icon.to_string(),
            title: title.to_string(),
        }
    }
}


/// Pre-built action links cloned into every row of a view.
#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub struct ActionTemplate {
    links: Vec<ActionLink>,
}


impl ActionTemplate {
    /// Creates a template from links.
    pub fn new( links: Vec<ActionLink> ) -> Self {
        Self { links }
    }


    /// The stock template for a view.
    pub fn for_view( view: ViewId ) -> Self {
        let popover = ActionLink::new( "popover", "more_vert", "Actions" );
        let links = match view {
            ViewId::QueueCurrent
            | ViewId::BrowsePlaylistDetail
            | ViewId::QueueJukeboxSong
            | ViewId::QueueJukeboxAlbum => vec![
                ActionLink::new( "quickRemove", "remove", "Remove" ),
                popover,
            ],
            ViewId::BrowseDatabaseTagList => vec![
                ActionLink::new( "showSongsByTag", "manage_search", "Show songs" ),
                popover,
            ],
            _ => vec![
                ActionLink::new( "quickPlay", "play_arrow", "Quick play" ),
                popover,
            ],
        };
        Self { links }
    }


    /// Returns a fresh copy of the links.
    pub fn instantiate( &self ) -> Vec<ActionLink> {
        self.links.clone()
    }


    pub fn links( &self ) -> &[ActionLink] {
        &self.links
    }
}


/// Translates field labels; translation itself lives outside the engine.
pub trait Translate {
    fn translate( &self, phrase: &str ) -> String;
}


/// Returns phrases unchanged.
#[derive( Debug, Clone, Copy, Default )]
pub struct NoTranslate;


impl Translate for NoTranslate {
    fn translate( &self, phrase: &str ) -> String {
        phrase.to_string()
    }
}


/// Everything the renderer needs besides the record.
pub struct RenderContext<'a> {
    pub config: &'a ViewConfig,
    pub layout: Layout,
    pub actions: &'a ActionTemplate,
    pub translate: &'a dyn Translate,
}


impl<'a> RenderContext<'a> {
    /// Creates a context with column layout and no translation.
    pub fn new( config: &'a ViewConfig, actions: &'a ActionTemplate ) -> Self {
        Self {
            config,
            layout: Layout::Columns,
            actions,
            translate: &NoTranslate,
        }
    }
}


/// Returns the header label of a table column.
pub fn header_name( field: &str ) -> &str {
    match field {
        "Track" | "Pos" => "#",
        "Thumbnail" => "",
        other => other,
    }
}


/// Renders a record into `row`, replacing its previous content.
///
/// Identity data is not touched; the reconciler attaches it beforehand.
pub fn render_row( row: &mut RenderedRow, record: &Record, ctx: &RenderContext<'_> ) {
    row.clear_content();
    let record = complete_record( record );

    row.content = match ctx.config.mode {
        ViewMode::Table => render_table( &record, ctx ),
        ViewMode::Grid => render_card( &record, ctx, false ),
        ViewMode::List => render_card( &record, ctx, true ),
    };
    row.actions = ctx.actions.instantiate();
}


fn render_table( record: &Record, ctx: &RenderContext<'_> ) -> Content {
    let fields = &ctx.config.fields;
    match ctx.layout {
        Layout::Columns => Content::Columns(
            fields.iter().map( |f| cell( f, None, record ) ).collect()
        ),
        Layout::Stacked if fields.len() == 1 => Content::Stacked(
            vec![ cell( &fields[ 0 ], None, record ) ]
        ),
        Layout::Stacked => Content::Stacked(
            fields
                .iter()
                .map( |f| cell( f, Some( ctx.translate.translate( f ) ), record ) )
                .collect()
        ),
    }
}


/// Card body for grid and list shapes.
///
/// The thumbnail becomes the card image rather than a body line. Lists skip
/// empty values after the title, grids keep them so cards line up.
fn render_card( record: &Record, ctx: &RenderContext<'_>, list: bool ) -> Content {
    let image = if ctx.config.contains( "Thumbnail" ) {
        record.str( "Thumbnail" ).map( str::to_string )
    } else {
        None
    };

    let mut body = Vec::new();
    for ( i, field ) in ctx.config.fields.iter().filter( |f| *f != "Thumbnail" ).enumerate() {
        let value = format_value( field, record.get( field ), record );
        if i == 0 {
            body.push( Cell { col: field.clone(), label: None, value } );
        } else if list {
            if !value.is_empty() {
                body.push( Cell { col: field.clone(), label: Some( ctx.translate.translate( field ) ), value } );
            }
        } else {
            body.push( Cell { col: field.clone(), label: None, value } );
        }
    }
    Content::Card { image, body }
}


fn cell( field: &str, label: Option<String>, record: &Record ) -> Cell {
    Cell {
        col: field.to_string(),
        label,
        value: format_value( field, record.get( field ), record ),
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use serde_json::json;


    fn song() -> Record {
        Record::try_from( json!({
            "Type": "song",
            "uri": "music/a.flac",
            "Title": "A",
            "Artist": [ "X" ],
            "Duration": 61,
            "Pos": 2,
        }) ).unwrap()
    }


    #[test]
    fn test_columns_follow_config_order() {
        let config = ViewConfig::new( ViewMode::Table, [ "Pos", "Title", "Duration" ] );
        let actions = ActionTemplate::for_view( ViewId::QueueCurrent );
        let ctx = RenderContext::new( &config, &actions );
        let mut row = RenderedRow::new();
        render_row( &mut row, &song(), &ctx );

        match &row.content {
            Content::Columns( cells ) => {
                let cols: Vec<&str> = cells.iter().map( |c| c.col.as_str() ).collect();
                assert_eq!( cols, vec![ "Pos", "Title", "Duration" ] );
                assert_eq!( cells[ 0 ].value, Fragment::text_of( "3" ) );
                assert_eq!( cells[ 2 ].value, Fragment::text_of( "1:01" ) );
            }
            other => panic!( "unexpected content {:?}", other ),
        }
        assert_eq!( row.actions.last().unwrap().action, "popover" );
    }


    #[test]
    fn test_stacked_labels() {
        let config = ViewConfig::new( ViewMode::Table, [ "Title", "Duration" ] );
        let actions = ActionTemplate::default();
        let mut ctx = RenderContext::new( &config, &actions );
        ctx.layout = Layout::Stacked;
        let mut row = RenderedRow::new();
        render_row( &mut row, &song(), &ctx );

        match &row.content {
            Content::Stacked( cells ) => {
                assert_eq!( cells.len(), 2 );
                assert_eq!( cells[ 1 ].label.as_deref(), Some( "Duration" ) );
            }
            other => panic!( "unexpected content {:?}", other ),
        }
    }


    #[test]
    fn test_stacked_single_field_has_no_label() {
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        let actions = ActionTemplate::default();
        let mut ctx = RenderContext::new( &config, &actions );
        ctx.layout = Layout::Stacked;
        let mut row = RenderedRow::new();
        render_row( &mut row, &song(), &ctx );
        assert_eq!( row.content, Content::Stacked( vec![ Cell {
            col: "Title".to_string(),
            label: None,
            value: Fragment::text_of( "A" ),
        } ] ) );
    }


    #[test]
    fn test_grid_card_takes_thumbnail_as_image() {
        let config = ViewConfig::new( ViewMode::Grid, [ "Thumbnail", "Title", "Album" ] );
        let actions = ActionTemplate::default();
        let ctx = RenderContext::new( &config, &actions );
        let mut row = RenderedRow::new();
        render_row( &mut row, &song(), &ctx );

        match &row.content {
            Content::Card { image, body } => {
                assert_eq!( image.as_deref(), Some( "/albumart?offset=0&uri=music%2Fa.flac" ) );
                assert_eq!( body.len(), 2 );
                assert_eq!( body[ 0 ].col, "Title" );
                assert!( body[ 1 ].value.is_empty() );
            }
            other => panic!( "unexpected content {:?}", other ),
        }
    }


    #[test]
    fn test_list_skips_empty_values() {
        let config = ViewConfig::new( ViewMode::List, [ "Title", "Album", "Duration" ] );
        let actions = ActionTemplate::default();
        let ctx = RenderContext::new( &config, &actions );
        let mut row = RenderedRow::new();
        render_row( &mut row, &song(), &ctx );

        match &row.content {
            Content::Card { image, body } => {
                assert!( image.is_none() );
                let cols: Vec<&str> = body.iter().map( |c| c.col.as_str() ).collect();
                assert_eq!( cols, vec![ "Title", "Duration" ] );
                assert_eq!( body[ 1 ].label.as_deref(), Some( "Duration" ) );
            }
            other => panic!( "unexpected content {:?}", other ),
        }
    }


    #[test]
    fn test_rerender_clears_previous_content() {
        let wide = ViewConfig::new( ViewMode::Table, [ "Title", "Duration" ] );
        let narrow = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        let actions = ActionTemplate::default();
        let mut row = RenderedRow::new();
        render_row( &mut row, &song(), &RenderContext::new( &wide, &actions ) );
        render_row( &mut row, &song(), &RenderContext::new( &narrow, &actions ) );
        assert!( matches!( &row.content, Content::Columns( cells ) if cells.len() == 1 ) );
    }


    #[test]
    fn test_layout_for_width() {
        assert_eq!( Layout::for_width( 400, true, SMALL_WIDTH_BREAKPOINT ), Layout::Stacked );
        assert_eq!( Layout::for_width( 400, false, SMALL_WIDTH_BREAKPOINT ), Layout::Columns );
        assert_eq!( Layout::for_width( 800, true, SMALL_WIDTH_BREAKPOINT ), Layout::Columns );
    }


    #[test]
    fn test_header_name() {
        assert_eq!( header_name( "Pos" ), "#" );
        assert_eq!( header_name( "Thumbnail" ), "" );
        assert_eq!( header_name( "Title" ), "Title" );
    }
}

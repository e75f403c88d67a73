//! List reconciliation
//!
//! Brings a container's rows in line with a freshly fetched page. Rows are
//! addressed by ordinal position: an existing node at the same slot is
//! overwritten in place, missing slots are appended and surplus slots are
//! trimmed. Album detail pages interleave disc and work dividers, which
//! shift every later slot by the number of dividers placed so far.

use tracing::{ debug, warn };

use crate::container::ViewContainer;
use crate::error::ViewError;
use crate::format::Icon;
use crate::page::{ EntryType, PageResult, Pagination, Record, Response };
use crate::render::{ render_row, ActionLink, Content, RenderContext };
use crate::row::{ EntryData, RenderedRow };


/// Callback run for every record, either as a hook before rendering or as a
/// custom builder that replaces the default renderer.
pub type RowHook<'a> = Box<dyn FnMut( &mut RenderedRow, &Record, &PageResult ) + 'a>;


/// Decides whether a new row stands for the same entry as an old one.
pub trait IdentityMatcher {
    fn matches( &self, new: &EntryData, old: &EntryData ) -> bool;
}


/// Matches rows with equal `EntryData::identity`. Rows without any identity
/// never match.
#[derive( Debug, Clone, Copy, Default )]
pub struct EntryIdentity;


impl IdentityMatcher for EntryIdentity {
    fn matches( &self, new: &EntryData, old: &EntryData ) -> bool {
        new.identity().is_some_and( |key| old.identity() == Some( key ) )
    }
}


/// Produces separator rows placed in front of a record.
pub trait DividerSource {
    /// Resets the source for a new pass over `page`.
    fn begin( &mut self, page: &PageResult );

    /// Returns the dividers to place before `record`, in order.
    fn before( &mut self, record: &Record, page: &PageResult ) -> Vec<RenderedRow>;
}


/// Disc and work dividers of the album detail view.
///
/// A disc row is placed whenever the disc number increases on an album with
/// more than one disc. A work row is placed whenever the `Work` tag changes,
/// if enabled.
#[derive( Debug, Clone, Default )]
pub struct AlbumDividers {
    show_work: bool,
    discs: bool,
    works: bool,
    last_disc: u64,
    last_work: String,
}


impl AlbumDividers {
    pub fn new( show_work: bool ) -> Self {
        Self { show_work, ..Self::default() }
    }


    fn divider( page: &PageResult, entry_type: EntryType, icon: Icon, key: &str, value: &str, text: String ) -> RenderedRow {
        let album = page.album.as_deref().unwrap_or_default();
        let mut row = RenderedRow::new();
        row.not_clickable = true;
        row.data.entry_type = Some( entry_type );
        row.data.name = Some( format!( "{} ({})", album, text ) );
        row.data.extras.insert( key.to_string(), value.to_string() );
        if let Some( id ) = &page.album_id {
            row.data.extras.insert( "AlbumId".to_string(), id.clone() );
        }
        row.content = Content::Divider { icon, text };
        row.actions = vec![ ActionLink::new( "popover", "more_vert", "Actions" ) ];
        row
    }
}


impl DividerSource for AlbumDividers {
    fn begin( &mut self, page: &PageResult ) {
        let first = page.data.first();
        self.discs = page.disc_count.unwrap_or( 0 ) > 1
            && first.is_some_and( |r| r.get( "Disc" ).is_some() );
        self.works = self.show_work
            && first.is_some_and( |r| r.get( "Work" ).is_some() );
        self.last_disc = 0;
        self.last_work.clear();
    }


    fn before( &mut self, record: &Record, page: &PageResult ) -> Vec<RenderedRow> {
        let mut out = Vec::new();

        if self.discs {
            if let Some( disc ) = disc_number( record ).filter( |d| *d > self.last_disc ) {
                out.push( Self::divider(
                    page,
                    EntryType::Disc,
                    Icon::Album,
                    "Disc",
                    &disc.to_string(),
                    format!( "Disc {}", disc ),
                ) );
                self.last_disc = disc;
            }
        }

        if self.works {
            let work = record.str( "Work" ).unwrap_or_default();
            if work != self.last_work {
                out.push( Self::divider( page, EntryType::Work, Icon::MusicNote, "Work", work, work.to_string() ) );
                self.last_work = work.to_string();
            }
        }

        out
    }
}


fn disc_number( record: &Record ) -> Option<u64> {
    let value = record.get( "Disc" )?;
    value.as_u64().or_else( || value.as_str().and_then( |s| s.trim().parse().ok() ) )
}


/// How consecutive pages of one view relate to each other.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum Paging {
    /// Every page replaces the previous one; surplus rows are trimmed.
    #[default]
    Exhaustive,

    /// Pages past the first are appended below the rows already shown.
    Incremental,
}


/// Optional collaborators of one reconcile pass.
pub struct ReconcileOptions<'a> {
    pub paging: Paging,
    pub per_row: Option<RowHook<'a>>,
    pub builder: Option<RowHook<'a>>,
    pub matcher: Box<dyn IdentityMatcher + 'a>,
    pub dividers: Option<Box<dyn DividerSource + 'a>>,

    /// Tags copied into each row's identity extras.
    pub identity_tags: Vec<String>,
}


impl Default for ReconcileOptions<'_> {
    fn default() -> Self {
        Self {
            paging: Paging::Exhaustive,
            per_row: None,
            builder: None,
            matcher: Box::new( EntryIdentity ),
            dividers: None,
            identity_tags: Vec::new(),
        }
    }
}


impl<'a> ReconcileOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }


    pub fn with_paging( mut self, paging: Paging ) -> Self {
        self.paging = paging;
        self
    }


    /// Runs `hook` on every new row before identity data is attached.
    pub fn with_hook( mut self, hook: impl FnMut( &mut RenderedRow, &Record, &PageResult ) + 'a ) -> Self {
        self.per_row = Some( Box::new( hook ) );
        self
    }


    /// Replaces the default renderer with `builder`.
    pub fn with_builder( mut self, builder: impl FnMut( &mut RenderedRow, &Record, &PageResult ) + 'a ) -> Self {
        self.builder = Some( Box::new( builder ) );
        self
    }


    pub fn with_matcher( mut self, matcher: impl IdentityMatcher + 'a ) -> Self {
        self.matcher = Box::new( matcher );
        self
    }


    pub fn with_dividers( mut self, dividers: impl DividerSource + 'a ) -> Self {
        self.dividers = Some( Box::new( dividers ) );
        self
    }


    pub fn with_identity_tags( mut self, tags: Vec<String> ) -> Self {
        self.identity_tags = tags;
        self
    }
}


/// Counters of one reconcile pass.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct ReconcileStats {
    /// Rows overwritten in place.
    pub updated: usize,
    pub appended: usize,
    pub removed: usize,

    /// Divider rows placed, included in `updated` or `appended`.
    pub dividers: usize,
}


/// State of an old row captured before the pass starts overwriting slots.
struct Snapshot {
    data: EntryData,
    selected: bool,
    playing: bool,
}


/// Reconciles the container against a transport response.
///
/// An error response leaves the container exactly as it was.
pub fn reconcile_response(
    container: &mut ViewContainer,
    response: &Response,
    ctx: &RenderContext<'_>,
    opts: &mut ReconcileOptions<'_>,
) -> Result<ReconcileStats, ViewError> {
    match response.page() {
        Ok( page ) => Ok( reconcile( container, page, ctx, opts ) ),
        Err( e ) => {
            warn!( "Not updating {}: {}", container.list_id(), e );
            Err( e )
        }
    }
}


/// Reconciles the container against one page of records.
///
/// @param container - Container holding the previous rendering
/// @param page - The page to show
/// @param ctx - Field configuration, layout and action template
/// @param opts - Paging mode, hooks, identity matcher and dividers
///
/// @returns What the pass did to the rows
pub fn reconcile(
    container: &mut ViewContainer,
    page: &PageResult,
    ctx: &RenderContext<'_>,
    opts: &mut ReconcileOptions<'_>,
) -> ReconcileStats {
    if !page.is_consistent() {
        warn!(
            "{}: returnedEntities is {} but the page holds {} records",
            container.list_id(),
            page.returned_entities,
            page.data.len(),
        );
    }

    let mut stats = ReconcileStats::default();
    let in_place = opts.paging == Paging::Exhaustive || page.offset == 0;
    let count = page.returned_entities.min( page.data.len() );
    let select_mode = container.select_mode;

    let snapshot: Vec<Snapshot> = container.rows
        .iter()
        .map( |r| Snapshot { data: r.data.clone(), selected: r.selected, playing: r.playing } )
        .collect();

    if let Some( dividers ) = opts.dividers.as_mut() {
        dividers.begin( page );
    }

    let mut z = 0;
    for ( i, record ) in page.data.iter().take( count ).enumerate() {
        let dividers = match opts.dividers.as_mut() {
            Some( source ) => source.before( record, page ),
            None => Vec::new(),
        };
        for divider in dividers {
            place( container, &snapshot, select_mode, in_place, i + z, divider, opts.matcher.as_ref(), &mut stats );
            z += 1;
            stats.dividers += 1;
        }

        let row = build_row( record, page, ctx, opts );
        place( container, &snapshot, select_mode, in_place, i + z, row, opts.matcher.as_ref(), &mut stats );
    }

    if in_place {
        let keep = count + z;
        if container.rows.len() > keep {
            stats.removed = container.rows.len() - keep;
            container.rows.truncate( keep );
        }
    }

    container.updating = false;
    container.pagination = Some( Pagination {
        offset: page.offset,
        limit: page.limit,
        total: page.total_entities,
        returned: page.returned_entities,
    });

    debug!(
        "Reconciled {}: {} updated, {} appended, {} removed, {} dividers",
        container.list_id(),
        stats.updated,
        stats.appended,
        stats.removed,
        stats.dividers,
    );
    stats
}


fn build_row( record: &Record, page: &PageResult, ctx: &RenderContext<'_>, opts: &mut ReconcileOptions<'_> ) -> RenderedRow {
    let mut row = RenderedRow::new();
    if let Some( hook ) = opts.per_row.as_mut() {
        hook( &mut row, record, page );
    }
    row.data.absorb( EntryData::from_record( record ).with_tags( record, &opts.identity_tags ) );

    match opts.builder.as_mut() {
        Some( builder ) => builder( &mut row, record, page ),
        None => render_row( &mut row, record, ctx ),
    }
    row
}


#[allow( clippy::too_many_arguments )]
fn place(
    container: &mut ViewContainer,
    snapshot: &[Snapshot],
    select_mode: bool,
    in_place: bool,
    slot: usize,
    mut row: RenderedRow,
    matcher: &dyn IdentityMatcher,
    stats: &mut ReconcileStats,
) {
    if !in_place || slot >= container.rows.len() {
        container.rows.push( row );
        stats.appended += 1;
        return;
    }

    if select_mode {
        row.selected = migrated_selection( snapshot, slot, &row.data, matcher );
    }
    if let Some( old ) = snapshot.get( slot ) {
        if old.playing && matcher.matches( &row.data, &old.data ) {
            row.playing = true;
        }
    }
    container.rows[ slot ].replace_with( row );
    stats.updated += 1;
}


/// Looks for the new row's identity at the same slot, then the next, then the
/// previous one, and carries over the selection of the first match.
fn migrated_selection( snapshot: &[Snapshot], slot: usize, data: &EntryData, matcher: &dyn IdentityMatcher ) -> bool {
    let candidates = [ Some( slot ), slot.checked_add( 1 ), slot.checked_sub( 1 ) ];
    candidates
        .into_iter()
        .flatten()
        .filter_map( |i| snapshot.get( i ) )
        .find( |old| matcher.matches( data, &old.data ) )
        .is_some_and( |old| old.selected )
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::render::ActionTemplate;
    use crate::view::{ ViewConfig, ViewId, ViewMode };
    use serde_json::json;


    fn page( offset: usize, total: i64, uris: &[&str] ) -> PageResult {
        let data = uris
            .iter()
            .map( |u| Record::try_from( json!({ "uri": u, "Type": "song", "Title": u.to_uppercase() }) ).unwrap() )
            .collect();
        PageResult::new( offset, 100, total, data )
    }


    fn uris( container: &ViewContainer ) -> Vec<Option<&str>> {
        container.rows.iter().map( |r| r.data.uri.as_deref() ).collect()
    }


    fn run( container: &mut ViewContainer, page: &PageResult ) -> ReconcileStats {
        let config = ViewConfig::new( ViewMode::Table, [ "Pos", "Title" ] );
        let actions = ActionTemplate::for_view( container.view() );
        let ctx = RenderContext::new( &config, &actions );
        reconcile( container, page, &ctx, &mut ReconcileOptions::new() )
    }


    #[test]
    fn test_fills_empty_container() {
        let mut container = ViewContainer::new( ViewId::QueueCurrent, ViewMode::Table );
        let first = PageResult { limit: 2, ..page( 0, 3, &[ "a", "b" ] ) };
        let stats = run( &mut container, &first );

        assert_eq!( uris( &container ), vec![ Some( "a" ), Some( "b" ) ] );
        assert_eq!( stats, ReconcileStats { appended: 2, ..ReconcileStats::default() } );
        assert_eq!( container.pagination, Some( Pagination { offset: 0, limit: 2, total: 3, returned: 2 } ) );
    }


    #[test]
    fn test_shrinking_page_reuses_first_node() {
        let mut container = ViewContainer::new( ViewId::QueueCurrent, ViewMode::Table );
        run( &mut container, &page( 0, 3, &[ "a", "b" ] ) );
        let first_id = container.rows[ 0 ].id();

        let stats = run( &mut container, &page( 0, 1, &[ "b" ] ) );
        assert_eq!( uris( &container ), vec![ Some( "b" ) ] );
        assert_eq!( container.rows[ 0 ].id(), first_id );
        assert_eq!( stats.updated, 1 );
        assert_eq!( stats.removed, 1 );
    }


    #[test]
    fn test_row_count_matches_returned_entities() {
        let mut container = ViewContainer::new( ViewId::Search, ViewMode::Table );
        run( &mut container, &page( 0, -1, &[ "a", "b", "c", "d", "e" ] ) );
        assert_eq!( container.len(), 5 );
        run( &mut container, &page( 0, -1, &[ "x", "y", "z" ] ) );
        assert_eq!( container.len(), 3 );
        run( &mut container, &page( 0, 0, &[] ) );
        assert!( container.is_empty() );
    }


    #[test]
    fn test_same_page_twice_is_identical() {
        let mut container = ViewContainer::new( ViewId::QueueCurrent, ViewMode::Table );
        let p = page( 0, 3, &[ "a", "b", "c" ] );
        run( &mut container, &p );
        let before = container.to_string();
        run( &mut container, &p );
        assert_eq!( container.to_string(), before );
    }


    #[test]
    fn test_selection_stays_with_identity() {
        let mut container = ViewContainer::new( ViewId::QueueCurrent, ViewMode::Table );
        container.set_select_mode( true );
        run( &mut container, &page( 0, 4, &[ "a", "b", "c", "d" ] ) );
        container.rows[ 2 ].selected = true;

        run( &mut container, &page( 0, 4, &[ "a", "b", "c", "e" ] ) );
        assert!( container.rows[ 2 ].selected );

        run( &mut container, &page( 0, 4, &[ "a", "b", "x", "y" ] ) );
        assert!( container.rows.iter().all( |r| !r.selected ) );
    }


    #[test]
    fn test_selection_follows_single_shift() {
        let mut container = ViewContainer::new( ViewId::QueueCurrent, ViewMode::Table );
        container.set_select_mode( true );
        run( &mut container, &page( 0, 4, &[ "a", "b", "c", "d" ] ) );
        container.rows[ 2 ].selected = true;

        // an insert at the front moves "c" from slot 2 to slot 3
        run( &mut container, &page( 0, 5, &[ "n", "a", "b", "c", "d" ] ) );
        let selected: Vec<_> = container.rows.iter().filter( |r| r.selected ).map( |r| r.data.uri.as_deref() ).collect();
        assert_eq!( selected, vec![ Some( "c" ) ] );
    }


    #[test]
    fn test_selection_ignored_outside_select_mode() {
        let mut container = ViewContainer::new( ViewId::QueueCurrent, ViewMode::Table );
        run( &mut container, &page( 0, 2, &[ "a", "b" ] ) );
        container.rows[ 0 ].selected = true;
        run( &mut container, &page( 0, 2, &[ "a", "b" ] ) );
        assert!( !container.rows[ 0 ].selected );
    }


    #[test]
    fn test_error_response_leaves_rows() {
        let mut container = ViewContainer::new( ViewId::BrowsePlaylistDetail, ViewMode::Table );
        run( &mut container, &page( 0, 2, &[ "a", "b" ] ) );
        container.updating = true;
        let before = container.to_string();

        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        let actions = ActionTemplate::default();
        let ctx = RenderContext::new( &config, &actions );
        let result = reconcile_response( &mut container, &Response::err( "gone" ), &ctx, &mut ReconcileOptions::new() );

        assert_eq!( result, Err( ViewError::Transport( "gone".to_string() ) ) );
        assert_eq!( container.to_string(), before );
        assert!( container.updating );
    }


    #[test]
    fn test_incremental_paging_appends() {
        let config = ViewConfig::new( ViewMode::List, [ "Title" ] );
        let actions = ActionTemplate::default();
        let ctx = RenderContext::new( &config, &actions );
        let mut opts = ReconcileOptions::new().with_paging( Paging::Incremental );
        let mut container = ViewContainer::new( ViewId::BrowseRadioWebradiodb, ViewMode::List );

        reconcile( &mut container, &page( 0, 4, &[ "a", "b" ] ), &ctx, &mut opts );
        let stats = reconcile( &mut container, &page( 2, 4, &[ "c", "d" ] ), &ctx, &mut opts );
        assert_eq!( uris( &container ), vec![ Some( "a" ), Some( "b" ), Some( "c" ), Some( "d" ) ] );
        assert_eq!( stats.appended, 2 );

        // a fresh first page replaces everything again
        reconcile( &mut container, &page( 0, 4, &[ "z" ] ), &ctx, &mut opts );
        assert_eq!( uris( &container ), vec![ Some( "z" ) ] );
    }


    #[test]
    fn test_hook_runs_before_identity() {
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        let actions = ActionTemplate::default();
        let ctx = RenderContext::new( &config, &actions );
        let mut seen = 0;
        let mut container = ViewContainer::new( ViewId::QueueCurrent, ViewMode::Table );
        {
            let mut opts = ReconcileOptions::new().with_hook( |row, record, _page| {
                seen += 1;
                if record.uri() == Some( "b" ) {
                    row.playing = true;
                    row.data.extras.insert( "songid".to_string(), "7".to_string() );
                }
            });
            reconcile( &mut container, &page( 0, 2, &[ "a", "b" ] ), &ctx, &mut opts );
        }
        assert_eq!( seen, 2 );
        assert!( container.rows[ 1 ].playing );
        assert_eq!( container.rows[ 1 ].data.extra( "songid" ), Some( "7" ) );
        assert_eq!( container.rows[ 1 ].data.uri.as_deref(), Some( "b" ) );
    }


    #[test]
    fn test_custom_builder_owns_content() {
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        let actions = ActionTemplate::for_view( ViewId::Home );
        let ctx = RenderContext::new( &config, &actions );
        let mut opts = ReconcileOptions::new().with_builder( |row, record, _page| {
            row.content = Content::Custom( Vec::new() );
            row.data.name = record.uri().map( |u| format!( "custom {}", u ) );
        });
        let mut container = ViewContainer::new( ViewId::Home, ViewMode::Grid );
        reconcile( &mut container, &page( 0, 1, &[ "a" ] ), &ctx, &mut opts );

        assert_eq!( container.rows[ 0 ].content, Content::Custom( Vec::new() ) );
        assert!( container.rows[ 0 ].actions.is_empty() );
    }


    fn album_page( disc_count: u32, discs: &[ u64 ] ) -> PageResult {
        let data = discs
            .iter()
            .enumerate()
            .map( |( i, d )| Record::try_from( json!({
                "uri": format!( "album/{}.flac", i ),
                "Type": "song",
                "Disc": d.to_string(),
                "Title": format!( "Track {}", i ),
            }) ).unwrap() )
            .collect();
        let mut page = PageResult::new( 0, 100, discs.len() as i64, data );
        page.disc_count = Some( disc_count );
        page.album_id = Some( "42".to_string() );
        page.album = Some( "Blue".to_string() );
        page
    }


    #[test]
    fn test_album_disc_dividers_shift_slots() {
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        let actions = ActionTemplate::for_view( ViewId::BrowseDatabaseAlbumDetail );
        let ctx = RenderContext::new( &config, &actions );
        let mut opts = ReconcileOptions::new().with_dividers( AlbumDividers::new( false ) );
        let mut container = ViewContainer::new( ViewId::BrowseDatabaseAlbumDetail, ViewMode::Table );

        let stats = reconcile( &mut container, &album_page( 2, &[ 1, 1, 2 ] ), &ctx, &mut opts );
        assert_eq!( container.len(), 5 );
        assert_eq!( stats.dividers, 2 );

        let types: Vec<_> = container.rows.iter().map( |r| r.data.entry_type ).collect();
        assert_eq!( types, vec![
            Some( EntryType::Disc ),
            Some( EntryType::Song ),
            Some( EntryType::Song ),
            Some( EntryType::Disc ),
            Some( EntryType::Song ),
        ] );
        assert!( container.rows[ 3 ].not_clickable );
        assert_eq!( container.rows[ 3 ].data.name.as_deref(), Some( "Blue (Disc 2)" ) );
        assert_eq!( container.rows[ 3 ].data.extra( "AlbumId" ), Some( "42" ) );

        // single disc album: no dividers, surplus rows trimmed
        let stats = reconcile( &mut container, &album_page( 1, &[ 1, 1 ] ), &ctx, &mut opts );
        assert_eq!( container.len(), 2 );
        assert_eq!( stats.removed, 3 );
        assert_eq!( stats.dividers, 0 );
    }


    #[test]
    fn test_work_dividers() {
        let data = [ "Suite", "Suite", "Sonata" ]
            .iter()
            .enumerate()
            .map( |( i, w )| Record::try_from( json!({ "uri": format!( "w{}", i ), "Type": "song", "Work": w }) ).unwrap() )
            .collect();
        let page = PageResult::new( 0, 100, 3, data );
        let mut source = AlbumDividers::new( true );
        source.begin( &page );

        let placed: Vec<usize> = page.data.iter().map( |r| source.before( r, &page ).len() ).collect();
        assert_eq!( placed, vec![ 1, 0, 1 ] );
    }


    #[test]
    fn test_entry_identity() {
        let a = EntryData { uri: Some( "a".to_string() ), ..EntryData::default() };
        let none = EntryData::default();
        assert!( EntryIdentity.matches( &a, &a.clone() ) );
        assert!( !EntryIdentity.matches( &none, &none ) );

        // the uri alone decides, whatever the entry type
        let stream = EntryData { entry_type: Some( EntryType::Stream ), ..a.clone() };
        assert!( EntryIdentity.matches( &stream, &a ) );

        // a uri never matches a uri-less row with the same position
        let slot = EntryData { pos: Some( 0 ), ..EntryData::default() };
        let placed = EntryData { pos: Some( 0 ), ..a.clone() };
        assert!( !EntryIdentity.matches( &placed, &slot ) );
    }


    fn albums( ids: &[&str] ) -> PageResult {
        let data = ids
            .iter()
            .map( |id| Record::try_from( json!({ "Type": "album", "AlbumId": id, "Album": id.to_uppercase() }) ).unwrap() )
            .collect();
        PageResult::new( 0, 100, ids.len() as i64, data )
    }


    #[test]
    fn test_album_selection_survives_refresh() {
        let mut container = ViewContainer::new( ViewId::BrowseDatabaseAlbumList, ViewMode::Grid );
        container.set_select_mode( true );
        run( &mut container, &albums( &[ "a1", "a2", "a3" ] ) );
        container.rows[ 1 ].selected = true;

        run( &mut container, &albums( &[ "a1", "a2", "a3" ] ) );
        assert!( container.rows[ 1 ].selected );

        // a removal in front shifts the album one slot up
        run( &mut container, &albums( &[ "a2", "a3" ] ) );
        let selected: Vec<_> = container.rows.iter().map( |r| r.selected ).collect();
        assert_eq!( selected, vec![ true, false ] );

        run( &mut container, &albums( &[ "b1", "b2" ] ) );
        assert!( container.rows.iter().all( |r| !r.selected ) );
    }


    #[test]
    fn test_tag_selection_survives_refresh() {
        let tags = |values: &[&str]| {
            let data = values.iter().map( |v| Record::try_from( json!({ "Value": v }) ).unwrap() ).collect();
            PageResult::new( 0, 100, values.len() as i64, data )
        };
        let mut container = ViewContainer::new( ViewId::BrowseDatabaseTagList, ViewMode::List );
        container.set_select_mode( true );
        run( &mut container, &tags( &[ "Bebop", "Modal" ] ) );
        container.rows[ 0 ].selected = true;

        run( &mut container, &tags( &[ "Bebop", "Modal" ] ) );
        assert!( container.rows[ 0 ].selected );
        assert!( !container.rows[ 1 ].selected );
    }


    /// Treats rows with the same display name as the same entry.
    struct SameName;


    impl IdentityMatcher for SameName {
        fn matches( &self, new: &EntryData, old: &EntryData ) -> bool {
            new.name.is_some() && new.name == old.name
        }
    }


    #[test]
    fn test_custom_matcher_decides_selection() {
        let config = ViewConfig::new( ViewMode::Table, [ "Title" ] );
        let actions = ActionTemplate::default();
        let ctx = RenderContext::new( &config, &actions );
        let named = |uri: &str, title: &str| Record::try_from( json!({ "uri": uri, "Type": "song", "Title": title }) ).unwrap();

        let mut container = ViewContainer::new( ViewId::Search, ViewMode::Table );
        container.set_select_mode( true );
        let first = PageResult::new( 0, 100, 2, vec![ named( "a", "Intro" ), named( "b", "Outro" ) ] );
        reconcile( &mut container, &first, &ctx, &mut ReconcileOptions::new() );
        container.rows[ 0 ].selected = true;

        // the uri changed, so the default matcher drops the selection
        let moved = PageResult::new( 0, 100, 2, vec![ named( "a2", "Intro" ), named( "b", "Outro" ) ] );
        reconcile( &mut container, &moved, &ctx, &mut ReconcileOptions::new() );
        assert!( !container.rows[ 0 ].selected );

        container.rows[ 0 ].selected = true;
        let renamed = PageResult::new( 0, 100, 2, vec![ named( "a3", "Intro" ), named( "b", "Outro" ) ] );
        reconcile( &mut container, &renamed, &ctx, &mut ReconcileOptions::new().with_matcher( SameName ) );
        assert!( container.rows[ 0 ].selected );
        assert!( !container.rows[ 1 ].selected );
    }
}

//! Command-line argument parsing for mpview.

use std::path::PathBuf;

use clap::Parser;

use mpview_core::{ ViewId, ViewMode };


/// mpview - browse media library pages in the terminal.
#[derive( Parser, Debug )]
#[command( name = "mpview" )]
#[command( version, about, long_about = None )]
pub struct Args {
    /// Directory of `<View>.json` page fixtures, or a single JSON file keyed by view.
    #[arg( short, long, default_value = "demos/pages" )]
    pub pages: PathBuf,

    /// View to open on startup.
    #[arg( short, long, default_value = "QueueCurrent", value_parser = parse_view )]
    pub view: ViewId,

    /// Override the configured mode of the startup view.
    #[arg( short, long, value_parser = parse_mode )]
    pub mode: Option<ViewMode>,

    /// Log filter, e.g. `debug` or `mpview_core=trace`. Falls back to RUST_LOG.
    #[arg( long )]
    pub log_level: Option<String>,
}


fn parse_view( s: &str ) -> Result<ViewId, String> {
    s.parse().map_err( |e: mpview_core::ViewError| e.to_string() )
}


fn parse_mode( s: &str ) -> Result<ViewMode, String> {
    s.parse().map_err( |e: mpview_core::ViewError| e.to_string() )
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_defaults() {
        let args = Args::parse_from( [ "mpview" ] );
        assert_eq!( args.view, ViewId::QueueCurrent );
        assert_eq!( args.pages, PathBuf::from( "demos/pages" ) );
        assert!( args.mode.is_none() );
    }


    #[test]
    fn test_view_and_mode() {
        let args = Args::parse_from( [ "mpview", "--view", "search", "--mode", "grid", "--log-level", "debug" ] );
        assert_eq!( args.view, ViewId::Search );
        assert_eq!( args.mode, Some( ViewMode::Grid ) );
        assert_eq!( args.log_level.as_deref(), Some( "debug" ) );
    }


    #[test]
    fn test_rejects_unknown_view() {
        assert!( Args::try_parse_from( [ "mpview", "--view", "Nowhere" ] ).is_err() );
    }
}

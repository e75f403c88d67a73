//! Slash command parsing.
//!
//! Commands typed after `/` in the TUI. They edit the per-view field
//! configuration, switch views and modes, and drive paging.

use thiserror::Error;

use mpview_core::{ ViewId, ViewMode };


/// Errors that can occur during command parsing.
#[derive( Debug, Error, PartialEq )]
pub enum CommandError {
    #[error( "Unknown command: {0}" )]
    Unknown( String ),

    #[error( "Invalid argument: {0}" )]
    InvalidArgument( String ),

    #[error( "Missing argument: {0}" )]
    MissingArgument( String ),
}


/// Parsed slash command.
#[derive( Debug, Clone, PartialEq )]
pub enum Command {
    // Navigation
    View { view: ViewId },
    Mode { mode: Option<ViewMode> },
    NextPage,
    PrevPage,
    Reload,

    // Field configuration
    Fields,
    AddField { field: String },
    RemoveField { field: String },
    FieldUp { field: String },
    FieldDown { field: String },

    // Selection
    Select,
    All,

    Help,
    Quit,
}


impl Command {
    /// Parses a command string (without the leading `/`).
    ///
    /// @param input - The command string to parse
    ///
    /// @returns The parsed command or an error
    pub fn parse( input: &str ) -> Result<Self, CommandError> {
        let input = input.trim();
        let mut parts = input.splitn( 2, ' ' );
        let cmd = parts.next().unwrap_or( "" ).to_lowercase();
        let args = parts.next().map( |s| s.trim() ).filter( |s| !s.is_empty() );

        let field = |what: &str| -> Result<String, CommandError> {
            args.map( str::to_string ).ok_or_else( || CommandError::MissingArgument( what.into() ) )
        };

        match cmd.as_str() {
            "view" | "v" => {
                let name = args.ok_or_else( || CommandError::MissingArgument( "view name".into() ) )?;
                let view = name.parse().map_err( |_| CommandError::InvalidArgument(
                    format!( "Unknown view: '{}'", name )
                ))?;
                Ok( Command::View { view } )
            }
            "mode" | "m" => {
                let mode = args
                    .map( |s| s.parse::<ViewMode>() )
                    .transpose()
                    .map_err( |_| CommandError::InvalidArgument(
                        "Invalid mode. Use 'table', 'grid' or 'list'".into()
                    ))?;
                Ok( Command::Mode { mode } )
            }
            "next" | "n" => Ok( Command::NextPage ),
            "prev" | "previous" | "p" => Ok( Command::PrevPage ),
            "reload" | "r" => Ok( Command::Reload ),

            "fields" | "f" => Ok( Command::Fields ),
            "add" | "a" => Ok( Command::AddField { field: field( "field name" )? } ),
            "remove" | "rm" => Ok( Command::RemoveField { field: field( "field name" )? } ),
            "up" => Ok( Command::FieldUp { field: field( "field name" )? } ),
            "down" => Ok( Command::FieldDown { field: field( "field name" )? } ),

            "select" | "sel" => Ok( Command::Select ),
            "all" => Ok( Command::All ),

            "help" | "h" => Ok( Command::Help ),
            "quit" | "q" | "exit" => Ok( Command::Quit ),

            "" => Err( CommandError::Unknown( "empty command".into() ) ),
            other => Err( CommandError::Unknown( other.to_string() ) ),
        }
    }
}


/// Returns help text listing all available commands.
pub fn help_text() -> &'static str {
    r#"Navigation:
  /view <name>      Open a view              [Tab]
  /mode [mode]      Set or cycle view mode   [m]
  /next  /prev      Page forward or back     [n/p]
  /reload           Re-read the page         [r]

Fields:
  /fields           List available fields
  /add <field>      Show a field
  /rm <field>       Hide a field
  /up <field>       Move a field left
  /down <field>     Move a field right

Selection:
  /select           Toggle select mode       [s]
  /all              Select or clear all      [a]

Other:
  /help             Show this help           [?]
  /quit             Exit mpview              [q]"#
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_parse_view() {
        let cmd = Command::parse( "view search" ).unwrap();
        assert_eq!( cmd, Command::View { view: ViewId::Search } );
    }


    #[test]
    fn test_parse_unknown_view() {
        let result = Command::parse( "v nowhere" );
        assert!( matches!( result, Err( CommandError::InvalidArgument( _ ) ) ) );
    }


    #[test]
    fn test_parse_mode() {
        assert_eq!( Command::parse( "mode grid" ).unwrap(), Command::Mode { mode: Some( ViewMode::Grid ) } );
        assert_eq!( Command::parse( "m" ).unwrap(), Command::Mode { mode: None } );
        assert!( Command::parse( "mode sideways" ).is_err() );
    }


    #[test]
    fn test_parse_field_edits() {
        assert_eq!( Command::parse( "add Genre" ).unwrap(), Command::AddField { field: "Genre".into() } );
        assert_eq!( Command::parse( "rm  Pos " ).unwrap(), Command::RemoveField { field: "Pos".into() } );
        assert_eq!( Command::parse( "up Title" ).unwrap(), Command::FieldUp { field: "Title".into() } );
    }


    #[test]
    fn test_parse_missing_arg() {
        let result = Command::parse( "add" );
        assert!( matches!( result, Err( CommandError::MissingArgument( _ ) ) ) );
    }


    #[test]
    fn test_parse_unknown() {
        let result = Command::parse( "foobar" );
        assert_eq!( result, Err( CommandError::Unknown( "foobar".into() ) ) );
    }
}

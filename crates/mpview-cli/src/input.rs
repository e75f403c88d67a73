//! Input mode handling for the TUI.
//!
//! Keys either drive the focused view or edit the slash command line. The
//! command line keeps a history and completes field and view names.


/// Current input mode of the application.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum InputMode {
    /// Keyboard shortcuts drive the focused view.
    #[default]
    Normal,

    /// Typing a slash command.
    Command,
}


/// Editable slash command line.
///
/// The cursor counts characters, not bytes.
#[derive( Debug, Default )]
pub struct CommandLine {
    chars: Vec<char>,
    cursor: usize,
    history: Vec<String>,
    recall: Option<usize>,
}


impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }


    pub fn insert( &mut self, c: char ) {
        self.chars.insert( self.cursor, c );
        self.cursor += 1;
    }


    /// Deletes the character before the cursor.
    pub fn backspace( &mut self ) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove( self.cursor );
        }
    }


    pub fn move_left( &mut self ) {
        self.cursor = self.cursor.saturating_sub( 1 );
    }


    pub fn move_right( &mut self ) {
        self.cursor = ( self.cursor + 1 ).min( self.chars.len() );
    }


    pub fn clear( &mut self ) {
        self.chars.clear();
        self.cursor = 0;
        self.recall = None;
    }


    pub fn content( &self ) -> String {
        self.chars.iter().collect()
    }


    pub fn cursor( &self ) -> usize {
        self.cursor
    }


    pub fn is_empty( &self ) -> bool {
        self.chars.is_empty()
    }


    /// Takes the current line, remembering it in the history.
    pub fn submit( &mut self ) -> String {
        let line = self.content();
        if !line.trim().is_empty() && self.history.last() != Some( &line ) {
            self.history.push( line.clone() );
        }
        self.clear();
        line
    }


    /// Steps back through the history.
    pub fn history_prev( &mut self ) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.recall {
            Some( i ) => i.saturating_sub( 1 ),
            None => self.history.len() - 1,
        };
        self.recall = Some( idx );
        self.set( self.history[ idx ].clone() );
    }


    /// Steps forward through the history, ending on an empty line.
    pub fn history_next( &mut self ) {
        match self.recall {
            Some( i ) if i + 1 < self.history.len() => {
                self.recall = Some( i + 1 );
                self.set( self.history[ i + 1 ].clone() );
            }
            Some( _ ) => self.clear(),
            None => {}
        }
    }


    /// Completes the word under the cursor against `candidates`.
    ///
    /// A unique match replaces the word; several matches extend it to their
    /// common prefix.
    ///
    /// @returns The matching candidates
    pub fn complete<'a>( &mut self, candidates: &'a [String] ) -> Vec<&'a str> {
        let start = self.chars[ ..self.cursor ]
            .iter()
            .rposition( |c| *c == ' ' )
            .map( |i| i + 1 )
            .unwrap_or( 0 );
        let word: String = self.chars[ start..self.cursor ].iter().collect();
        let word_lower = word.to_lowercase();

        let matches: Vec<&str> = candidates
            .iter()
            .map( String::as_str )
            .filter( |c| c.to_lowercase().starts_with( &word_lower ) )
            .collect();

        let replacement = match matches.as_slice() {
            [] => return matches,
            [ only ] => only.to_string(),
            [ first, rest @ .. ] => common_prefix( first, rest ),
        };
        if replacement.chars().count() >= word.chars().count() {
            let tail: Vec<char> = self.chars.split_off( self.cursor );
            self.chars.truncate( start );
            self.chars.extend( replacement.chars() );
            self.cursor = self.chars.len();
            self.chars.extend( tail );
        }
        matches
    }


    fn set( &mut self, line: String ) {
        self.chars = line.chars().collect();
        self.cursor = self.chars.len();
    }
}


/// Case-insensitive common prefix, spelled as in `first`.
fn common_prefix( first: &str, rest: &[&str] ) -> String {
    let mut len = first.chars().count();
    for other in rest {
        len = first
            .chars()
            .zip( other.chars() )
            .take( len )
            .take_while( |( a, b )| a.eq_ignore_ascii_case( b ) )
            .count();
    }
    first.chars().take( len ).collect()
}


#[cfg( test )]
mod tests {
    use super::*;


    fn typed( s: &str ) -> CommandLine {
        let mut line = CommandLine::new();
        for c in s.chars() {
            line.insert( c );
        }
        line
    }


    #[test]
    fn test_editing_counts_chars() {
        let mut line = typed( "añadir" );
        line.move_left();
        line.backspace();
        assert_eq!( line.content(), "añadr" );
        assert_eq!( line.cursor(), 4 );
    }


    #[test]
    fn test_history_recall() {
        let mut line = typed( "view search" );
        assert_eq!( line.submit(), "view search" );
        line.insert( 'q' );
        line.submit();

        line.history_prev();
        assert_eq!( line.content(), "q" );
        line.history_prev();
        assert_eq!( line.content(), "view search" );
        line.history_next();
        assert_eq!( line.content(), "q" );
        line.history_next();
        assert!( line.is_empty() );
    }


    #[test]
    fn test_complete_unique() {
        let candidates = vec![ "Genre".to_string(), "Date".to_string() ];
        let mut line = typed( "add ge" );
        assert_eq!( line.complete( &candidates ), vec![ "Genre" ] );
        assert_eq!( line.content(), "add Genre" );
    }


    #[test]
    fn test_complete_common_prefix() {
        let candidates = vec![ "AlbumArtist".to_string(), "Album".to_string(), "Artist".to_string() ];
        let mut line = typed( "add al" );
        assert_eq!( line.complete( &candidates ).len(), 2 );
        assert_eq!( line.content(), "add Album" );
    }


    #[test]
    fn test_complete_no_match_keeps_line() {
        let mut line = typed( "rm zz" );
        assert!( line.complete( &[ "Title".to_string() ] ).is_empty() );
        assert_eq!( line.content(), "rm zz" );
    }
}

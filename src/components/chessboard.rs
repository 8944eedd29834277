use cozy_chess::{BitBoard, Board, GameStatus, Piece};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::Widget;

/// Width of one square in terminal columns.
const SQUARE_WIDTH: u16 = 3;
const FILES: &str = "abcdefgh";

/// Rule status of a chess position, as shown under the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardStatus {
    Ongoing,
    Check,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    Invalid,
}

impl BoardStatus {
    pub fn from_fen(fen: &str) -> Self {
        match Board::from_fen(fen.trim(), false) {
            Ok(board) => Self::of(&board),
            Err(_) => BoardStatus::Invalid,
        }
    }

    fn of(board: &Board) -> Self {
        match board.status() {
            GameStatus::Won => return BoardStatus::Checkmate,
            GameStatus::Drawn if board.halfmove_clock() < 100 => return BoardStatus::Stalemate,
            _ => {}
        }
        if board.halfmove_clock() >= 100 {
            BoardStatus::FiftyMoveRule
        } else if insufficient_material(board) {
            BoardStatus::InsufficientMaterial
        } else if !board.checkers().is_empty() {
            BoardStatus::Check
        } else {
            BoardStatus::Ongoing
        }
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            BoardStatus::Ongoing => None,
            BoardStatus::Check => Some("Check!"),
            BoardStatus::Checkmate => Some("Checkmate!"),
            BoardStatus::Stalemate => Some("Draw! (stalemate)"),
            BoardStatus::InsufficientMaterial => Some("Draw! (insufficient material)"),
            BoardStatus::FiftyMoveRule => Some("Draw! (fifty-move rule)"),
            BoardStatus::Invalid => Some("Invalid position"),
        }
    }

    pub fn color(self) -> Color {
        match self {
            BoardStatus::Ongoing => Color::Gray,
            BoardStatus::Check => Color::Yellow,
            BoardStatus::Checkmate => Color::Red,
            BoardStatus::Invalid => Color::DarkGray,
            _ => Color::Cyan,
        }
    }
}

/// Bare kings, a single minor piece, or bishops all on one square colour.
fn insufficient_material(board: &Board) -> bool {
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !heavy.is_empty() {
        return false;
    }
    let knights = board.pieces(Piece::Knight);
    let bishops = board.pieces(Piece::Bishop);
    if (knights | bishops).len() <= 1 {
        return true;
    }
    knights.is_empty() && same_square_colour(bishops)
}

fn same_square_colour(squares: BitBoard) -> bool {
    let mut parities = squares.into_iter().map(|sq| (sq.file() as u8 + sq.rank() as u8) % 2);
    match parities.next() {
        Some(first) => parities.all(|p| p == first),
        None => true,
    }
}

/// Pieces by rank (8 down to 1) and file (a to h), from the placement field of a FEN.
pub type Placement = [[Option<char>; 8]; 8];

pub fn parse_placement(fen: &str) -> Option<Placement> {
    let field = fen.split_whitespace().next()?;
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return None;
    }

    let mut placement: Placement = [[None; 8]; 8];
    for (row, rank) in ranks.iter().enumerate() {
        let mut file = 0usize;
        for c in rank.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
            } else if "pnbrqkPNBRQK".contains(c) {
                if file >= 8 {
                    return None;
                }
                placement[row][file] = Some(c);
                file += 1;
            } else {
                return None;
            }
        }
        if file != 8 {
            return None;
        }
    }
    Some(placement)
}

fn glyph(piece: char) -> char {
    match piece {
        'K' => '♔',
        'Q' => '♕',
        'R' => '♖',
        'B' => '♗',
        'N' => '♘',
        'P' => '♙',
        'k' => '♚',
        'q' => '♛',
        'r' => '♜',
        'b' => '♝',
        'n' => '♞',
        'p' => '♟',
        other => other,
    }
}

/// An 8x8 board with rank and file labels. Renders nothing for an unparseable FEN.
pub struct ChessBoard<'a> {
    pub fen: &'a str,
}

impl ChessBoard<'_> {
    pub const WIDTH: u16 = 2 + 8 * SQUARE_WIDTH;
    pub const HEIGHT: u16 = 9;
}

impl Widget for ChessBoard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(placement) = parse_placement(self.fen) else {
            return;
        };
        if area.width < Self::WIDTH || area.height < Self::HEIGHT {
            return;
        }

        let label = Style::default().fg(Color::DarkGray);
        for (row, rank) in placement.iter().enumerate() {
            let y = area.y + row as u16;
            buf.set_string(area.x, y, format!("{}", 8 - row), label);

            for (file, square) in rank.iter().enumerate() {
                let x = area.x + 2 + file as u16 * SQUARE_WIDTH;
                let light = (row + file) % 2 == 0;
                let bg = if light { Color::Rgb(240, 217, 181) } else { Color::Rgb(181, 136, 99) };
                let mut style = Style::default().bg(bg).fg(Color::Black);
                if square.is_some_and(|p| p.is_ascii_uppercase()) {
                    style = style.add_modifier(Modifier::BOLD);
                }
                let text = match square {
                    Some(piece) => format!(" {} ", glyph(*piece)),
                    None => "   ".to_string(),
                };
                buf.set_string(x, y, text, style);
            }
        }

        let footer_y = area.y + 8;
        for (file, name) in FILES.chars().enumerate() {
            let x = area.x + 2 + file as u16 * SQUARE_WIDTH + 1;
            buf.set_string(x, footer_y, name.to_string(), label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn start_position_is_ongoing() {
        assert_eq!(BoardStatus::from_fen(START), BoardStatus::Ongoing);
        assert_eq!(BoardStatus::Ongoing.label(), None);
    }

    #[test]
    fn detects_checkmate_and_check() {
        // Fool's mate.
        let mate = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
        assert_eq!(BoardStatus::from_fen(mate), BoardStatus::Checkmate);
        assert_eq!(BoardStatus::Checkmate.label(), Some("Checkmate!"));

        let check = "rnbqkbnr/ppp2ppp/3p4/1B2p3/4P3/8/PPPP1PPP/RNBQK1NR b KQkq - 1 3";
        assert_eq!(BoardStatus::from_fen(check), BoardStatus::Check);
    }

    #[test]
    fn detects_draws() {
        let stalemate = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
        assert_eq!(BoardStatus::from_fen(stalemate), BoardStatus::Stalemate);

        let bare_kings = "8/8/4k3/8/8/3K4/8/8 w - - 0 1";
        assert_eq!(BoardStatus::from_fen(bare_kings), BoardStatus::InsufficientMaterial);

        let lone_knight = "8/8/4k3/8/8/3K4/8/6N1 w - - 0 1";
        assert_eq!(BoardStatus::from_fen(lone_knight), BoardStatus::InsufficientMaterial);

        let fifty = "8/8/4k3/8/8/3K4/8/R7 w - - 100 80";
        assert_eq!(BoardStatus::from_fen(fifty), BoardStatus::FiftyMoveRule);
    }

    #[test]
    fn rook_endgame_is_sufficient() {
        let rook = "8/8/4k3/8/8/3K4/8/R7 w - - 0 1";
        assert_eq!(BoardStatus::from_fen(rook), BoardStatus::Ongoing);
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(BoardStatus::from_fen(""), BoardStatus::Invalid);
        assert_eq!(BoardStatus::from_fen("not a fen"), BoardStatus::Invalid);
    }

    #[test]
    fn placement_parses_ranks_top_down() {
        let placement = parse_placement(START).unwrap();
        assert_eq!(placement[0][0], Some('r'));
        assert_eq!(placement[0][4], Some('k'));
        assert_eq!(placement[7][4], Some('K'));
        assert_eq!(placement[4], [None; 8]);
    }

    #[test]
    fn placement_rejects_malformed_rows() {
        assert!(parse_placement("8/8/8").is_none());
        assert!(parse_placement("9/8/8/8/8/8/8/8 w - - 0 1").is_none());
        assert!(parse_placement("ppppppppp/8/8/8/8/8/8/8 w - - 0 1").is_none());
        assert!(parse_placement("x7/8/8/8/8/8/8/8 w - - 0 1").is_none());
    }

    #[test]
    fn board_renders_into_buffer() {
        let area = Rect::new(0, 0, ChessBoard::WIDTH, ChessBoard::HEIGHT);
        let mut buf = Buffer::empty(area);
        ChessBoard { fen: START }.render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "8");
        assert_eq!(buf[(3, 0)].symbol(), "♜");
        assert_eq!(buf[(3, 8)].symbol(), "a");
    }
}

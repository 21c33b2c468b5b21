use std::str::FromStr;

use ::chess::{Board, BoardStatus, ChessMove as EngineMove, Color, MoveGen, Piece, Rank, Square};

use super::ChessMove;
use crate::games::{MoveError, Seat};

/// The narrow surface through which chess positions are loaded, moved and queried.
pub trait ChessEngine: Sized {
    fn load(fen: &str) -> Result<Self, MoveError>;
    fn fen(&self) -> String;
    /// Plays a move and returns it in standard algebraic notation.
    fn make_move(&mut self, from: &str, to: &str, promotion: Option<char>) -> Result<String, MoveError>;
    fn turn(&self) -> Seat;
    fn is_check(&self) -> bool;
    fn is_checkmate(&self) -> bool;
    fn is_stalemate(&self) -> bool;
    fn is_draw(&self) -> bool;
    fn legal_moves(&self) -> Vec<ChessMove>;
}

/// [`ChessEngine`] backed by the `chess` crate, with move clocks tracked alongside.
#[derive(Debug, Clone)]
pub struct StandardChess {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl ChessEngine for StandardChess {
    fn load(fen: &str) -> Result<Self, MoveError> {
        let board = Board::from_str(fen)
            .map_err(|e| MoveError::rule(format!("invalid position: {}", e)))?;
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let halfmove_clock = fields.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
        let fullmove_number = fields.get(5).and_then(|s| s.parse().ok()).unwrap_or(1);
        Ok(StandardChess {
            board,
            halfmove_clock,
            fullmove_number,
        })
    }

    fn fen(&self) -> String {
        // The board renders placeholder clocks and names the capturable pawn
        // rather than the square behind it; swap in the standard fields.
        let rendered = self.board.to_string();
        let position: Vec<&str> = rendered.split_whitespace().take(3).collect();
        let en_passant = self
            .board
            .en_passant()
            .map(|pawn| en_passant_target(pawn, self.board.side_to_move()).to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} {} {}",
            position.join(" "),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    fn make_move(&mut self, from: &str, to: &str, promotion: Option<char>) -> Result<String, MoveError> {
        let src = Square::from_str(from).map_err(|_| MoveError::rule("invalid from square"))?;
        let dest = Square::from_str(to).map_err(|_| MoveError::rule("invalid to square"))?;
        let side = self.board.side_to_move();

        let piece = self
            .board
            .piece_on(src)
            .ok_or_else(|| MoveError::rule("no piece on the from square"))?;
        if self.board.color_on(src) != Some(side) {
            return Err(MoveError::rule("that piece belongs to the opponent"));
        }

        let promotion = match promotion {
            Some(c) => Some(promotion_piece(c)?),
            None if piece == Piece::Pawn && dest.get_rank() == last_rank(side) => Some(Piece::Queen),
            None => None,
        };

        let mv = EngineMove::new(src, dest, promotion);
        if !MoveGen::new_legal(&self.board).any(|legal| legal == mv) {
            return Err(MoveError::rule("illegal move"));
        }

        let notation = san(&self.board, mv);
        let capture = self.board.piece_on(dest).is_some()
            || (piece == Piece::Pawn && src.get_file() != dest.get_file());
        self.halfmove_clock = if piece == Piece::Pawn || capture {
            0
        } else {
            self.halfmove_clock + 1
        };
        if side == Color::Black {
            self.fullmove_number += 1;
        }
        self.board = self.board.make_move_new(mv);
        Ok(notation)
    }

    fn turn(&self) -> Seat {
        match self.board.side_to_move() {
            Color::White => Seat::Player1,
            Color::Black => Seat::Player2,
        }
    }

    fn is_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    fn is_draw(&self) -> bool {
        self.is_stalemate() || self.halfmove_clock >= 100 || insufficient_material(&self.board)
    }

    fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board)
            .map(|m| ChessMove {
                from: m.get_source().to_string(),
                to: m.get_dest().to_string(),
                promotion: m.get_promotion().map(|p| promotion_letter(p).to_string()),
            })
            .collect()
    }
}

/// The square a capturing pawn lands on, directly behind the pawn that just
/// made a double step.
fn en_passant_target(pawn: Square, side_to_move: Color) -> Square {
    let rank = match side_to_move {
        Color::White => Rank::Sixth,
        Color::Black => Rank::Third,
    };
    Square::make_square(rank, pawn.get_file())
}

fn last_rank(side: Color) -> Rank {
    match side {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

fn promotion_piece(c: char) -> Result<Piece, MoveError> {
    match c.to_ascii_lowercase() {
        'q' => Ok(Piece::Queen),
        'r' => Ok(Piece::Rook),
        'b' => Ok(Piece::Bishop),
        'n' => Ok(Piece::Knight),
        _ => Err(MoveError::rule("invalid promotion piece")),
    }
}

fn promotion_letter(piece: Piece) -> &'static str {
    match piece {
        Piece::Rook => "r",
        Piece::Bishop => "b",
        Piece::Knight => "n",
        _ => "q",
    }
}

fn piece_letter(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "",
        Piece::Knight => "N",
        Piece::Bishop => "B",
        Piece::Rook => "R",
        Piece::Queen => "Q",
        Piece::King => "K",
    }
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.get_file().to_index() as u8) as char
}

fn rank_char(sq: Square) -> char {
    (b'1' + sq.get_rank().to_index() as u8) as char
}

fn insufficient_material(board: &Board) -> bool {
    let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy.popcnt() > 0 {
        return false;
    }
    let minors = *board.pieces(Piece::Knight) | *board.pieces(Piece::Bishop);
    minors.popcnt() <= 1
}

/// Standard algebraic notation for a legal move on `board`.
fn san(board: &Board, mv: EngineMove) -> String {
    let src = mv.get_source();
    let dest = mv.get_dest();
    let Some(piece) = board.piece_on(src) else {
        return mv.to_string();
    };

    let after = board.make_move_new(mv);
    let suffix = if after.status() == BoardStatus::Checkmate {
        "#"
    } else if after.checkers().popcnt() > 0 {
        "+"
    } else {
        ""
    };

    if piece == Piece::King && src.get_file().to_index().abs_diff(dest.get_file().to_index()) == 2 {
        let castle = if dest.get_file().to_index() > src.get_file().to_index() {
            "O-O"
        } else {
            "O-O-O"
        };
        return format!("{}{}", castle, suffix);
    }

    let capture = board.piece_on(dest).is_some()
        || (piece == Piece::Pawn && src.get_file() != dest.get_file());

    let mut out = String::new();
    if piece == Piece::Pawn {
        if capture {
            out.push(file_char(src));
        }
    } else {
        out.push_str(piece_letter(piece));
        let rivals: Vec<Square> = MoveGen::new_legal(board)
            .filter(|m| m.get_dest() == dest && m.get_source() != src)
            .filter(|m| board.piece_on(m.get_source()) == Some(piece))
            .map(|m| m.get_source())
            .collect();
        if !rivals.is_empty() {
            let shares_file = rivals.iter().any(|r| r.get_file() == src.get_file());
            let shares_rank = rivals.iter().any(|r| r.get_rank() == src.get_rank());
            if !shares_file {
                out.push(file_char(src));
            } else if !shares_rank {
                out.push(rank_char(src));
            } else {
                out.push(file_char(src));
                out.push(rank_char(src));
            }
        }
    }
    if capture {
        out.push('x');
    }
    out.push_str(&dest.to_string());
    if let Some(promoted) = mv.get_promotion() {
        out.push('=');
        out.push_str(piece_letter(promoted));
    }
    out.push_str(suffix);
    out
}

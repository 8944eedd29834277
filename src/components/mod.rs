pub mod chessboard;

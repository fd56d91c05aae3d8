//! External collaborators: board renderer, vector→raster converter, annotator, outcome stamper.

pub mod board_svg;
pub mod command;
pub mod fixture;
pub mod resvg_convert;
pub mod traits;

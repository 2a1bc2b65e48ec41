use crate::prelude::Position;

/// Height of the HD camera image in pixels.
pub const HD_FRAME_HEIGHT_PX: f64 = 4608.0;

/// Padding that the WDD applies twice to `roi_center` and `roi_coordinates`.
pub const WDD_PADDING_PX: f64 = 125.0;

/// Reverses the 90-degree clockwise rotation applied by the annotation tool.
pub fn unrotate(rotated: Position, hd_height: f64) -> Position {
    Position::new(rotated.y, hd_height - rotated.x)
}

/// Shifts a WDD position by the missing padding offset on both axes.
pub fn fix_padding(position: Position, offset: f64) -> Position {
    Position::new(position.x + offset, position.y + offset)
}

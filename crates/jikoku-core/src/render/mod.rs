//! Reply rendering
//!
//! 時刻表を Flex Message カード、またはプレーンテキストに変換します。

mod card;
mod icons;
mod template;
mod text;

pub use card::{render_card, CardDocument};
pub use icons::IconMap;
pub use template::{CardTemplate, FlexCard};
pub use text::render_text;

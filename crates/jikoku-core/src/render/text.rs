//! Plain-text renderer

use crate::route::{Route, ROUTE_SEPARATOR};
use crate::timetable::TimeTableEntry;

/// "◯渋谷から新宿" の見出しに続けて、一行ずつ "10:00 -> 10:15 , 特急" を並べる
pub fn render_text(route: &Route, table: &[TimeTableEntry]) -> String {
    let mut text = format!("◯{}{}{}", route.starting_point, ROUTE_SEPARATOR, route.end_point);

    for entry in table {
        text.push('\n');
        text.push_str(&format!(
            "{} -> {} , {}",
            entry.departure(),
            entry.arrival(),
            entry.train_type.label()
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::TrainType;

    #[test]
    fn test_render_text() {
        let table = vec![
            TimeTableEntry::new("10:00", "10:15", TrainType::Local, 0),
            TimeTableEntry::new("10:05", "10:20", TrainType::Rapid, 1),
            TimeTableEntry::new("10:10", "10:40", TrainType::Other("unknown_type".to_string()), 0),
        ];

        let text = render_text(&Route::new("渋谷", "新宿"), &table);
        assert_eq!(
            text,
            "◯渋谷から新宿\n10:00 -> 10:15 , 普通\n10:05 -> 10:20 , 特急\n10:10 -> 10:40 , 区間快速"
        );
    }

    #[test]
    fn test_render_text_empty_table() {
        let text = render_text(&Route::new("A", "B"), &[]);
        assert_eq!(text, "◯AからB");
    }
}

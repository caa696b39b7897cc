pub mod role_badge;
pub mod section_tabs;
pub mod sidebar;
pub mod timetable_table;

pub mod m202602010001_create_departments;
pub mod m202602010002_create_branches;
pub mod m202602010003_create_semesters;
pub mod m202602010004_create_classes;
pub mod m202602010005_create_users;
pub mod m202602010006_create_teacher_classes;
pub mod m202602080001_create_attendance;
pub mod m202602080002_create_attendance_overrides;
pub mod m202602150001_create_password_logs;
pub mod m202602200001_create_wifi_networks;

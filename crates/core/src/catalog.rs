//! Course catalog - the fixed module list.

use crate::id::{LessonId, ModuleId};
use serde::Serialize;

/// Number of modules in the course.
pub const MODULE_COUNT: u8 = 14;

/// Number of lessons across all modules.
pub const TOTAL_LESSONS: u32 = 73;

/// Static description of one course module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    /// Module number
    pub id: u8,

    /// Display title
    pub title: &'static str,

    /// Short subtitle
    pub subtitle: &'static str,

    /// Lesson count, fixed for the lifetime of a progress document
    pub lessons: u8,

    /// Display icon
    pub icon: &'static str,
}

/// Course title.
pub const COURSE_TITLE: &str = "Python: From Zero to Full-Stack Developer";

/// All modules in course order.
pub const MODULES: [ModuleInfo; MODULE_COUNT as usize] = [
    ModuleInfo { id: 1, title: "The Absolute Basics", subtitle: "The 'What'", lessons: 5, icon: "🎯" },
    ModuleInfo { id: 2, title: "Storing & Using Information", subtitle: "The 'Boxes'", lessons: 5, icon: "📦" },
    ModuleInfo { id: 3, title: "Making Decisions", subtitle: "The 'Forks in the Road'", lessons: 5, icon: "🔀" },
    ModuleInfo { id: 4, title: "Repeating Actions", subtitle: "The 'Loops'", lessons: 5, icon: "🔁" },
    ModuleInfo { id: 5, title: "Grouping Information", subtitle: "The 'Containers'", lessons: 6, icon: "🗂️" },
    ModuleInfo { id: 6, title: "Creating Reusable Tools", subtitle: "The 'Recipes'", lessons: 5, icon: "🧰" },
    ModuleInfo { id: 7, title: "Handling Mistakes", subtitle: "The 'Safety Nets'", lessons: 5, icon: "🛡️" },
    ModuleInfo { id: 8, title: "Blueprints for Code", subtitle: "Object-Oriented Programming", lessons: 6, icon: "🏗️" },
    ModuleInfo { id: 9, title: "Working with the Real World", subtitle: "Files & Libraries", lessons: 6, icon: "🌍" },
    ModuleInfo { id: 10, title: "Building for the Web", subtitle: "Back-End", lessons: 6, icon: "🌐" },
    ModuleInfo { id: 11, title: "Storing Data", subtitle: "Databases", lessons: 6, icon: "💾" },
    ModuleInfo { id: 12, title: "Building for the User", subtitle: "Front-End Basics", lessons: 6, icon: "🎨" },
    ModuleInfo { id: 13, title: "Tying It All Together", subtitle: "Full Stack", lessons: 6, icon: "🚀" },
    ModuleInfo { id: 14, title: "Sharing Your Work", subtitle: "Deployment & Tools", lessons: 5, icon: "📤" },
];

/// Look up a module by id.
pub fn module(id: ModuleId) -> Option<&'static ModuleInfo> {
    let index = usize::from(id.get()).checked_sub(1)?;
    MODULES.get(index)
}

/// Iterate module ids in course order.
pub fn module_ids() -> impl Iterator<Item = ModuleId> {
    (1..=MODULE_COUNT).map(ModuleId::new)
}

/// Iterate lesson ids of a module in ascending order.
pub fn lesson_ids(info: &ModuleInfo) -> impl Iterator<Item = LessonId> {
    (1..=info.lessons).map(LessonId::new)
}

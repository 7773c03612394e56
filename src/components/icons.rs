//! Centralized icon definitions.
//!
//! Icon theme is configured in `config.rs` via `ICON_THEME`.

use icondata::Icon;

use crate::config::IconTheme;

mod lucide {
    pub use icondata::{
        LuBug as Debug, LuChevronLeft as Back, LuFileText as Details, LuSlidersHorizontal as Filter,
        LuPencil as Edit, LuPlus as Plus, LuSettings as Settings, LuUser as User,
        LuUsers as Clients, LuX as Close,
    };
}

mod bootstrap {
    pub use icondata::{
        BsBug as Debug, BsChevronLeft as Back, BsFileEarmarkText as Details, BsFunnel as Filter,
        BsGear as Settings, BsPencil as Edit, BsPeople as Clients, BsPerson as User,
        BsPlusLg as Plus, BsXLg as Close,
    };
}

macro_rules! themed_icon {
    ($name:ident, $theme_name:ident) => {
        pub const $name: Icon = match crate::config::ICON_THEME {
            IconTheme::Lucide => lucide::$theme_name,
            IconTheme::Bootstrap => bootstrap::$theme_name,
        };
    };
}

themed_icon!(BACK, Back);
themed_icon!(CLIENTS, Clients);
themed_icon!(CLOSE, Close);
themed_icon!(DEBUG, Debug);
themed_icon!(DETAILS, Details);
themed_icon!(EDIT, Edit);
themed_icon!(FILTER, Filter);
themed_icon!(PLUS, Plus);
themed_icon!(SETTINGS, Settings);
themed_icon!(USER, User);

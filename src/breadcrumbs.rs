//! Breadcrumb trail for admin pages.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Home,
    List,
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Crumb {
    pub visible: bool,
    pub name: Option<String>,
    pub param: BTreeMap<String, String>,
    pub view: View,
}

pub fn get_crumb(name: Option<&str>, visible: bool, view: View, param: BTreeMap<String, String>) -> Crumb {
    Crumb {
        visible,
        name: name.map(str::to_string),
        param,
        view,
    }
}

/// Trail for `table` (shown as `label`) on `view`. `id` names the row on row-level views.
pub fn breadcrumbs(table: &str, label: &str, view: View, id: Option<&str>) -> Vec<Crumb> {
    let param = || BTreeMap::from([("name".to_string(), table.to_string())]);
    let mut trail = vec![
        get_crumb(Some("Dashboard"), true, View::Home, param()),
        get_crumb(Some(label), true, View::List, param()),
    ];
    match view {
        View::Home | View::List => {}
        View::Create => trail.push(get_crumb(Some("create"), false, View::List, param())),
        View::Read | View::Update | View::Delete => trail.push(get_crumb(id, false, View::List, param())),
    }
    trail
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param() -> BTreeMap<String, String> {
        BTreeMap::from([("name".to_string(), "foo".to_string())])
    }

    #[test]
    fn crumb_fields() {
        let crumb = get_crumb(Some("Dashboard"), true, View::Home, param());
        assert_eq!(
            crumb,
            Crumb {
                visible: true,
                name: Some("Dashboard".into()),
                param: param(),
                view: View::Home,
            }
        );
    }

    #[test]
    fn list_trail_has_two_visible_crumbs() {
        let bc = breadcrumbs("foo", "ffoo", View::List, None);
        assert_eq!(
            bc,
            vec![
                get_crumb(Some("Dashboard"), true, View::Home, param()),
                get_crumb(Some("ffoo"), true, View::List, param()),
            ]
        );
    }

    #[test]
    fn create_trail_ends_with_hidden_create() {
        let bc = breadcrumbs("foo", "barr", View::Create, None);
        assert_eq!(bc.len(), 3);
        assert_eq!(bc[1].name.as_deref(), Some("barr"));
        assert_eq!(bc[2], get_crumb(Some("create"), false, View::List, param()));
    }

    #[test]
    fn read_trail_ends_with_row_label() {
        let bc = breadcrumbs("foo", "bazz", View::Read, None);
        assert_eq!(bc.len(), 3);
        assert_eq!(bc[2], get_crumb(None, false, View::List, param()));

        let bc = breadcrumbs("foo", "bazz", View::Update, Some("7"));
        assert_eq!(bc[2].name.as_deref(), Some("7"));
        assert!(!bc[2].visible);
    }
}

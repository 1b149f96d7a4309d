use cupid_types::models::Session;

use crate::guard::{AccessGuard, Decision};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Public prank form.
    Home,
    AdminLogin,
    /// Submission dashboard, admins only.
    Admin,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::AdminLogin => "/admin-login",
            Self::Admin => "/admin",
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Self::Home),
            "/admin-login" => Some(Self::AdminLogin),
            "/admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(String),
    NotFound,
}

/// Route table with the admin guard applied to `/admin`.
#[derive(Debug, Clone)]
pub struct Routes {
    admin_guard: AccessGuard,
}

impl Routes {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            admin_guard: AccessGuard::admin_only(login_path),
        }
    }

    pub fn login_path(&self) -> &str {
        self.admin_guard.login_path()
    }

    pub fn resolve(&self, path: &str, session: &Session) -> Resolution {
        match Route::parse(path) {
            Some(Route::Admin) => match self.admin_guard.evaluate(session) {
                Decision::Allow => Resolution::Render(Route::Admin),
                Decision::RedirectUnauthenticated(_) => {
                    Resolution::Redirect(self.login_path().to_string())
                }
            },
            Some(route) => Resolution::Render(route),
            None => Resolution::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::DEFAULT_LOGIN_PATH;
    use cupid_types::models::{Role, User};

    fn session(role: Role) -> Session {
        Session::Authenticated {
            token: "abc".into(),
            user: User { username: "abreham".into(), role },
        }
    }

    #[test]
    fn parse_known_paths() {
        assert_eq!(Route::parse("/"), Some(Route::Home));
        assert_eq!(Route::parse(""), Some(Route::Home));
        assert_eq!(Route::parse("/admin/"), Some(Route::Admin));
        assert_eq!(Route::parse("/admin-login"), Some(Route::AdminLogin));
        assert_eq!(Route::parse("/admins"), None);
        for route in [Route::Home, Route::AdminLogin, Route::Admin] {
            assert_eq!(Route::parse(route.path()), Some(route));
        }
    }

    #[test]
    fn public_routes_render_for_anyone() {
        let routes = Routes::new(DEFAULT_LOGIN_PATH);
        assert_eq!(routes.resolve("/", &Session::Anonymous), Resolution::Render(Route::Home));
        assert_eq!(
            routes.resolve("/admin-login", &Session::Anonymous),
            Resolution::Render(Route::AdminLogin)
        );
        assert_eq!(routes.resolve("/nope", &Session::Anonymous), Resolution::NotFound);
    }

    #[test]
    fn admin_route_is_guarded() {
        let routes = Routes::new("/login");
        assert_eq!(
            routes.resolve("/admin", &Session::Anonymous),
            Resolution::Redirect("/login".into())
        );
        assert_eq!(
            routes.resolve("/admin", &session(Role::Other("user".into()))),
            Resolution::Redirect("/login".into())
        );
        assert_eq!(
            routes.resolve("/admin", &session(Role::Admin)),
            Resolution::Render(Route::Admin)
        );
    }
}

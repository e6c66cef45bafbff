//! # 服务器共享状态

use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::AuthService;

/// 只读的图书目录
#[derive(Debug, Clone, Default)]
pub struct BookCatalog {
    authors: HashMap<String, String>,
}

impl BookCatalog {
    /// The fixed catalog served by `/v1/book/{id}`.
    #[must_use]
    pub fn reference() -> Self {
        [
            ("112333", "Ryan Boyd"),
            ("434444", "Yvonne Wilson"),
            ("644444", "Prabath Siriwarden"),
        ]
        .into_iter()
        .collect()
    }

    /// 按书籍 ID 查询作者
    #[must_use]
    pub fn author(&self, id: &str) -> Option<&str> {
        self.authors.get(id).map(String::as_str)
    }

    /// 书籍数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.authors.len()
    }

    /// 目录是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BookCatalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            authors: iter
                .into_iter()
                .map(|(id, author)| (id.into(), author.into()))
                .collect(),
        }
    }
}

/// 服务器应用状态
#[derive(Clone)]
pub struct AppState {
    auth: AuthService,
    books: Arc<BookCatalog>,
}

impl AppState {
    /// 创建应用状态
    #[must_use]
    pub fn new(auth: AuthService, books: BookCatalog) -> Self {
        Self {
            auth,
            books: Arc::new(books),
        }
    }

    /// 认证服务
    #[must_use]
    pub const fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// 书籍目录
    #[must_use]
    pub fn books(&self) -> &BookCatalog {
        &self.books
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_catalog() {
        let books = BookCatalog::reference();
        assert_eq!(books.len(), 3);
        assert_eq!(books.author("112333"), Some("Ryan Boyd"));
        assert_eq!(books.author("434444"), Some("Yvonne Wilson"));
        assert_eq!(books.author("644444"), Some("Prabath Siriwarden"));
        assert_eq!(books.author("1"), None);
    }
}

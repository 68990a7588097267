#[cfg(test)]
pub mod test_helpers {
    use chrono::NaiveDate;

    use crate::{Author, Book, BookInstance, Genre, LoanStatus, RecordId};

    /// Creates an author payload with the given names and no dates.
    pub fn sample_author(first_name: &str, family_name: &str) -> Author {
        Author {
            first_name: first_name.to_string(),
            family_name: family_name.to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    /// Creates a genre payload with the given name.
    pub fn sample_genre(name: &str) -> Genre {
        Genre {
            name: name.to_string(),
        }
    }

    /// Creates a book payload referencing the given author and genres.
    pub fn sample_book(title: &str, author: RecordId, genre: Vec<RecordId>) -> Book {
        Book {
            title: title.to_string(),
            author,
            summary: format!("{} summary", title),
            isbn: "9781234567897".to_string(),
            genre,
        }
    }

    /// Creates a copy payload referencing the given book, in maintenance.
    pub fn sample_instance(book: RecordId) -> BookInstance {
        BookInstance {
            book,
            imprint: "Test Imprint".to_string(),
            status: LoanStatus::Maintenance,
            due_back: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        }
    }
}

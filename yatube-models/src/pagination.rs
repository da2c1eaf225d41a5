use serde::Serialize;

/// Posts shown on a listing page.
pub const POSTS_PER_PAGE: i64 = 10;
/// Comments shown under a post.
pub const COMMENTS_PER_PAGE: i64 = 10;

/// Reads a page number the way a form integer field would: surrounding
/// whitespace is ignored and so is a decimal part made only of zeros.
///
/// Anything that is not an integer gives `None`.
pub fn clean_page_number(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let integer = match raw.find('.') {
        Some(dot) if raw[dot + 1..].chars().all(|c| c == '0') => &raw[..dot],
        Some(_) => return None,
        None => raw,
    };
    integer.parse::<i64>().ok()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paginator {
    pub count: i64,
    pub per_page: i64,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Paginator {
        Paginator {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    /// Total number of pages, an empty sequence still having one.
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// The page that will actually be served for a requested number.
    pub fn validate_number(&self, number: Option<i64>) -> i64 {
        match number {
            Some(n) if n > self.num_pages() => self.num_pages(),
            Some(n) if n >= 1 => n,
            _ => 1,
        }
    }

    /// Offset bounds `(min, max)` of a page, to be used as `OFFSET min LIMIT max - min`.
    pub fn limits(&self, number: i64) -> (i64, i64) {
        let number = self.validate_number(Some(number));
        ((number - 1) * self.per_page, number * self.per_page)
    }

    pub fn page<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
        let number = self.validate_number(Some(number));
        let num_pages = self.num_pages();
        Page {
            items,
            number,
            num_pages,
            count: self.count,
            has_next: number < num_pages,
            has_previous: number > 1,
            next_page_number: if number < num_pages {
                Some(number + 1)
            } else {
                None
            },
            previous_page_number: if number > 1 { Some(number - 1) } else { None },
            page_range: (1..=num_pages).collect(),
        }
    }
}

/// One page of an ordered sequence, with what is needed to link to its neighbours.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<i64>,
    pub previous_page_number: Option<i64>,
    pub page_range: Vec<i64>,
}

impl<T> Page<T> {
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<Vec<U>, E>>()?,
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
            page_range: self.page_range,
        })
    }
}

/// Slices an in-memory sequence. Invalid page numbers never fail.
pub fn paginate<T>(items: Vec<T>, page_size: i64, requested: Option<&str>) -> Page<T> {
    let paginator = Paginator::new(items.len() as i64, page_size);
    let number = paginator.validate_number(clean_page_number(requested));
    let (min, max) = paginator.limits(number);
    let slice = items
        .into_iter()
        .skip(min as usize)
        .take((max - min) as usize)
        .collect();
    paginator.page(number, slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_page_number_inputs() {
        let cases: &[(Option<&str>, Option<i64>)] = &[
            (None, None),
            (Some(""), None),
            (Some("2"), Some(2)),
            (Some(" 3 "), Some(3)),
            (Some("4.0"), Some(4)),
            (Some("5.000"), Some(5)),
            (Some("5."), Some(5)),
            (Some("5.5"), None),
            (Some("-1"), Some(-1)),
            (Some("abc"), None),
            (Some("1e3"), None),
            (Some("99999999999999999999999"), None),
        ];
        for (raw, expected) in cases {
            assert_eq!(clean_page_number(*raw), *expected, "input {:?}", raw);
        }
    }

    #[test]
    fn num_pages() {
        let cases = [(0, 10, 1), (1, 10, 1), (10, 10, 1), (11, 10, 2), (15, 10, 2), (21, 10, 3)];
        for (count, per_page, expected) in cases.iter() {
            assert_eq!(Paginator::new(*count, *per_page).num_pages(), *expected);
        }
    }

    #[test]
    fn validate_number_clamps() {
        let paginator = Paginator::new(15, 10);
        assert_eq!(paginator.validate_number(None), 1);
        assert_eq!(paginator.validate_number(Some(0)), 1);
        assert_eq!(paginator.validate_number(Some(-3)), 1);
        assert_eq!(paginator.validate_number(Some(2)), 2);
        assert_eq!(paginator.validate_number(Some(40)), 2);
        assert_eq!(paginator.limits(2), (10, 20));
        assert_eq!(paginator.limits(7), (10, 20));
    }

    #[test]
    fn pages_cover_the_sequence_once() {
        for count in 0..35 {
            for page_size in 1..12 {
                let items: Vec<i64> = (0..count).collect();
                let first = paginate(items.clone(), page_size, None);
                let expected_pages = if count == 0 {
                    1
                } else {
                    (count + page_size - 1) / page_size
                };
                assert_eq!(first.num_pages, expected_pages);

                let mut seen = Vec::new();
                for number in 1..=first.num_pages {
                    let page = paginate(items.clone(), page_size, Some(number.to_string().as_str()));
                    assert_eq!(page.number, number);
                    assert!(page.items.len() as i64 <= page_size);
                    assert_eq!(page.has_next, number < expected_pages);
                    assert_eq!(page.has_previous, number > 1);
                    seen.extend(page.items);
                }
                assert_eq!(seen, items);
            }
        }
    }

    #[test]
    fn paginate_fifteen_items() {
        let items: Vec<i32> = (0..15).collect();
        let first = paginate(items.clone(), 10, Some("1"));
        assert_eq!(first.items.len(), 10);
        assert!(first.has_next);
        assert_eq!(first.next_page_number, Some(2));
        assert_eq!(first.previous_page_number, None);
        assert_eq!(first.page_range, vec![1, 2]);

        let second = paginate(items.clone(), 10, Some("2"));
        assert_eq!(second.items, (10..15).collect::<Vec<_>>());
        assert!(!second.has_next);
        assert!(second.has_previous);

        assert_eq!(paginate(items.clone(), 10, Some("nope")).number, 1);
        assert_eq!(paginate(items.clone(), 10, Some("0")).number, 1);
        assert_eq!(paginate(items, 10, Some("12")).items.len(), 5);
    }

    #[test]
    fn empty_sequence_has_one_page() {
        let page = paginate(Vec::<i32>::new(), 10, Some("3"));
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next && !page.has_previous);
    }

    #[test]
    fn try_map_keeps_metadata() {
        let page = paginate(vec![1, 2, 3], 2, Some("2"));
        let mapped: Page<String> = page
            .clone()
            .try_map(|i| Ok::<_, ()>(i.to_string()))
            .unwrap();
        assert_eq!(mapped.items, vec!["3".to_owned()]);
        assert_eq!(mapped.number, page.number);
        assert_eq!(mapped.has_previous, page.has_previous);
    }
}

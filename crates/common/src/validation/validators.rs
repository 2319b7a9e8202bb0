// Field Validators - Reusable validation components

/// Type alias for a boxed field validator (clippy::type_complexity)
type BoxedFieldValidator<T> = Box<dyn FieldValidator<T> + Send + Sync>;

/// Trait for field validators
pub trait FieldValidator<T: ?Sized> {
    /// Validate a field value
    fn validate(&self, value: &T) -> Result<(), String>;
}

/// String validator with various constraints
///
/// Lengths are counted in characters, not bytes.
#[derive(Debug, Clone)]
pub struct StringValidator {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<regex::Regex>,
    not_empty: bool,
    trim: bool,
}

impl Default for StringValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl StringValidator {
    /// Create a new string validator
    pub fn new() -> Self {
        Self { min_length: None, max_length: None, pattern: None, not_empty: false, trim: false }
    }

    /// Require non-empty string
    pub fn not_empty(mut self) -> Self {
        self.not_empty = true;
        self
    }

    /// Set minimum length
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Set maximum length (inclusive)
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Set pattern to match
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(regex::Regex::new(pattern)?);
        Ok(self)
    }

    /// Use an already compiled pattern
    pub fn with_regex(mut self, pattern: regex::Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Set whether to trim before validation
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

impl FieldValidator<str> for StringValidator {
    fn validate(&self, value: &str) -> Result<(), String> {
        let val = if self.trim { value.trim() } else { value };

        if self.not_empty && val.is_empty() {
            return Err("is required".to_string());
        }

        let length = val.chars().count();

        if let Some(min) = self.min_length {
            if length < min {
                return Err(format!("length must be at least {min} characters"));
            }
        }

        if let Some(max) = self.max_length {
            if length > max {
                return Err(format!("length must not exceed {max} characters (got {length})"));
            }
        }

        if let Some(ref pattern) = self.pattern {
            if !pattern.is_match(val) {
                return Err(format!("must match pattern: {}", pattern.as_str()));
            }
        }

        Ok(())
    }
}

impl FieldValidator<String> for StringValidator {
    fn validate(&self, value: &String) -> Result<(), String> {
        FieldValidator::<str>::validate(self, value.as_str())
    }
}

impl FieldValidator<&str> for StringValidator {
    fn validate(&self, value: &&str) -> Result<(), String> {
        FieldValidator::<str>::validate(self, value)
    }
}

/// Collection validator for vectors and other collections
pub struct CollectionValidator<T> {
    min_size: Option<usize>,
    max_size: Option<usize>,
    item_validator: Option<BoxedFieldValidator<T>>,
}

impl<T> std::fmt::Debug for CollectionValidator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionValidator")
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("item_validator", &"<dyn FieldValidator>")
            .finish()
    }
}

impl<T> Default for CollectionValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CollectionValidator<T> {
    /// Create a new collection validator
    pub fn new() -> Self {
        Self { min_size: None, max_size: None, item_validator: None }
    }

    /// Set minimum size
    pub fn min_size(mut self, min: usize) -> Self {
        self.min_size = Some(min);
        self
    }

    /// Set maximum size
    pub fn max_size(mut self, max: usize) -> Self {
        self.max_size = Some(max);
        self
    }

    /// Set a validator for individual items in the collection
    ///
    /// If an item fails validation, the error message includes the index of
    /// the failing item.
    ///
    /// # Example
    ///
    /// ```
    /// use rosterlink_common::validation::{CollectionValidator, StringValidator};
    ///
    /// let validator: CollectionValidator<String> =
    ///     CollectionValidator::new().min_size(1).item_validator(StringValidator::new().not_empty());
    /// ```
    pub fn item_validator<V>(mut self, validator: V) -> Self
    where
        V: FieldValidator<T> + Send + Sync + 'static,
    {
        self.item_validator = Some(Box::new(validator));
        self
    }
}

impl<T> FieldValidator<[T]> for CollectionValidator<T> {
    fn validate(&self, value: &[T]) -> Result<(), String> {
        let size = value.len();

        if let Some(min) = self.min_size {
            if size < min {
                return Err(format!("must contain at least {min} items"));
            }
        }

        if let Some(max) = self.max_size {
            if size > max {
                return Err(format!("must not exceed {max} items"));
            }
        }

        if let Some(ref validator) = self.item_validator {
            for (index, item) in value.iter().enumerate() {
                if let Err(e) = validator.validate(item) {
                    return Err(format!("item at index {index} {e}"));
                }
            }
        }

        Ok(())
    }
}

impl<T> FieldValidator<Vec<T>> for CollectionValidator<T> {
    fn validate(&self, value: &Vec<T>) -> Result<(), String> {
        FieldValidator::<[T]>::validate(self, value.as_slice())
    }
}

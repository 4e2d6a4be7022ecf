use crate::errors::CqlError;
use crate::query::intent::SortOrder;

/// Abstract column type, resolved 1:1 to a dialect type token.
///
/// Collection and tuple variants carry their inner type names; an empty
/// inner type fails at compile time, not at the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Ascii,
    Bigint,
    Blob,
    Boolean,
    Counter,
    Date,
    Decimal,
    Double,
    Duration,
    Float,
    Frozen,
    Inet,
    Int,
    List(String),
    Map(String, String),
    Set(String),
    Smallint,
    Text,
    Time,
    Timestamp,
    Timeuuid,
    Tinyint,
    Tuple(String, String, String),
    Uuid,
    Varchar,
    Varint,
}

impl ColumnType {
    pub fn as_cql(&self) -> Result<String, CqlError> {
        let token = match self {
            Self::Ascii => "ascii".to_string(),
            Self::Bigint => "bigint".to_string(),
            Self::Blob => "blob".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Counter => "counter".to_string(),
            Self::Date => "date".to_string(),
            Self::Decimal => "decimal".to_string(),
            Self::Double => "double".to_string(),
            Self::Duration => "duration".to_string(),
            Self::Float => "float".to_string(),
            Self::Frozen => "frozen".to_string(),
            Self::Inet => "inet".to_string(),
            Self::Int => "int".to_string(),
            Self::List(element) => {
                Self::require_inner("list", element)?;
                format!("list<{}>", element)
            }
            Self::Map(key, value) => {
                Self::require_inner("map", key)?;
                Self::require_inner("map", value)?;
                format!("map<{}, {}>", key, value)
            }
            Self::Set(element) => {
                Self::require_inner("set", element)?;
                format!("set<{}>", element)
            }
            Self::Smallint => "smallint".to_string(),
            Self::Text => "text".to_string(),
            Self::Time => "time".to_string(),
            Self::Timestamp => "timestamp".to_string(),
            Self::Timeuuid => "timeuuid".to_string(),
            Self::Tinyint => "tinyint".to_string(),
            Self::Tuple(first, second, third) => {
                Self::require_inner("tuple", first)?;
                Self::require_inner("tuple", second)?;
                Self::require_inner("tuple", third)?;
                format!("tuple<{}, {}, {}>", first, second, third)
            }
            Self::Uuid => "uuid".to_string(),
            Self::Varchar => "varchar".to_string(),
            Self::Varint => "varint".to_string(),
        };
        Ok(token)
    }

    fn require_inner(kind: &str, inner: &str) -> Result<(), CqlError> {
        if inner.is_empty() {
            return Err(CqlError::MalformedStatement(format!(
                "{} column requires an inner type",
                kind
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub is_static: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: false,
            is_static: false,
        }
    }
}

/// An immutable table definition: ordered columns, one partition-key group
/// and ordered clustering columns, each with an explicit direction.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub(crate) name: String,
    pub(crate) columns: Vec<ColumnDefinition>,
    pub(crate) partition_key: Vec<String>,
    pub(crate) clustering: Vec<(String, SortOrder)>,
    pub(crate) if_not_exists: bool,
}

impl TableDefinition {
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            columns: Vec::new(),
            partition_key: Vec::new(),
            clustering: Vec::new(),
            if_not_exists: false,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn partition_key(&self) -> &[String] {
        &self.partition_key
    }

    pub fn clustering(&self) -> &[(String, SortOrder)] {
        &self.clustering
    }
}

/// Fluent table builder. Features the dialect cannot express record the
/// first offending request and surface it at `build()`, before any text
/// could be compiled.
pub struct TableBuilder {
    name: String,
    columns: Vec<ColumnDefinition>,
    partition_key: Vec<String>,
    clustering: Vec<(String, SortOrder)>,
    if_not_exists: bool,
    error: Option<CqlError>,
}

impl TableBuilder {
    fn add_column(mut self, ty: ColumnType, column: impl Into<String>) -> Self {
        self.columns.push(ColumnDefinition::new(column, ty));
        self
    }

    pub fn ascii(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Ascii, column)
    }

    pub fn bigint(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Bigint, column)
    }

    pub fn blob(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Blob, column)
    }

    pub fn boolean(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Boolean, column)
    }

    pub fn counter(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Counter, column)
    }

    pub fn date(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Date, column)
    }

    pub fn decimal(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Decimal, column)
    }

    pub fn double(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Double, column)
    }

    pub fn duration(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Duration, column)
    }

    pub fn float(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Float, column)
    }

    pub fn frozen(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Frozen, column)
    }

    pub fn inet(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Inet, column)
    }

    pub fn int(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Int, column)
    }

    pub fn list(self, column: impl Into<String>, element: impl Into<String>) -> Self {
        self.add_column(ColumnType::List(element.into()), column)
    }

    pub fn map(
        self,
        column: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.add_column(ColumnType::Map(key.into(), value.into()), column)
    }

    pub fn set(self, column: impl Into<String>, element: impl Into<String>) -> Self {
        self.add_column(ColumnType::Set(element.into()), column)
    }

    pub fn smallint(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Smallint, column)
    }

    pub fn text(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Text, column)
    }

    pub fn time(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Time, column)
    }

    pub fn timestamp(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Timestamp, column)
    }

    pub fn timeuuid(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Timeuuid, column)
    }

    pub fn tinyint(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Tinyint, column)
    }

    pub fn tuple(
        self,
        column: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
        third: impl Into<String>,
    ) -> Self {
        self.add_column(
            ColumnType::Tuple(first.into(), second.into(), third.into()),
            column,
        )
    }

    pub fn uuid(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Uuid, column)
    }

    pub fn varchar(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Varchar, column)
    }

    pub fn varint(self, column: impl Into<String>) -> Self {
        self.add_column(ColumnType::Varint, column)
    }

    /// Mark the most recently added column as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        match self.columns.last_mut() {
            Some(column) => column.primary_key = true,
            None => self.record_malformed("primary key modifier requires a column"),
        }
        self
    }

    /// Mark the most recently added column as static.
    pub fn static_column(mut self) -> Self {
        match self.columns.last_mut() {
            Some(column) => column.is_static = true,
            None => self.record_malformed("static modifier requires a column"),
        }
        self
    }

    /// Add columns to the partition-key group. Repeated calls merge.
    pub fn partition<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_key.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append a clustering column with its sort direction.
    pub fn clustering(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.clustering.push((column.into(), order));
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn enum_column(self, _column: impl Into<String>) -> Self {
        self.unsupported("enum columns")
    }

    pub fn json(self, _column: impl Into<String>) -> Self {
        self.unsupported("json columns")
    }

    pub fn auto_increment(self, _column: impl Into<String>) -> Self {
        self.unsupported("auto-increment columns")
    }

    pub fn temporary(self) -> Self {
        self.unsupported("temporary tables")
    }

    pub fn charset(self, _charset: impl Into<String>) -> Self {
        self.unsupported("setting the charset")
    }

    pub fn collation(self, _collation: impl Into<String>) -> Self {
        self.unsupported("setting the collation")
    }

    pub fn engine(self, _engine: impl Into<String>) -> Self {
        self.unsupported("setting the storage engine")
    }

    pub fn unique<I, S>(self, _columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unsupported("unique indexes")
    }

    pub fn fulltext<I, S>(self, _columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unsupported("fulltext indexes")
    }

    pub fn spatial_index<I, S>(self, _columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unsupported("spatial indexes")
    }

    pub fn foreign<I, S>(self, _columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unsupported("foreign keys")
    }

    pub fn drop_primary(self) -> Self {
        self.unsupported("dropping a primary key")
    }

    fn unsupported(mut self, what: &str) -> Self {
        if self.error.is_none() {
            self.error = Some(CqlError::UnsupportedFeature(format!(
                "this dialect does not support {}",
                what
            )));
        }
        self
    }

    fn record_malformed(&mut self, message: &str) {
        if self.error.is_none() {
            self.error = Some(CqlError::MalformedStatement(message.to_string()));
        }
    }

    pub fn build(self) -> Result<TableDefinition, CqlError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.name.is_empty() {
            return Err(CqlError::MalformedStatement(
                "table requires a name".to_string(),
            ));
        }

        Ok(TableDefinition {
            name: self.name,
            columns: self.columns,
            partition_key: self.partition_key,
            clustering: self.clustering,
            if_not_exists: self.if_not_exists,
        })
    }
}

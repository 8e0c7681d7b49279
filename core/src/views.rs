//! Form and list layout of the admin views. Field names are the JSON field names
//! of the models and forms in [crate::model].

use serde::{Serialize, Serializer};

type Pairs = &'static [(&'static str, &'static str)];

/// Static description of one admin view, served as is by the `_info` endpoints
#[derive(Serialize, Debug, Clone, Copy)]
pub struct ViewConfig {
    pub route_base: &'static str,
    pub list_title: &'static str,
    pub show_title: &'static str,
    pub add_title: &'static str,
    pub edit_title: &'static str,
    pub list_columns: &'static [&'static str],
    pub add_columns: &'static [&'static str],
    pub edit_columns: &'static [&'static str],
    pub show_columns: &'static [&'static str],
    pub search_columns: &'static [&'static str],
    #[serde(serialize_with = "as_map")]
    pub description_columns: Pairs,
    #[serde(serialize_with = "as_map")]
    pub label_columns: Pairs,
    pub page_size: Option<u32>,
    pub can_delete: bool,
    /// (field, direction) the list is sorted by
    pub base_order: Option<(&'static str, &'static str)>,
}

impl ViewConfig {
    pub fn label(&self, field: &str) -> Option<&'static str> {
        lookup(self.label_columns, field)
    }

    /// Every field named by one of the column lists
    pub fn fields(&self) -> impl Iterator<Item = &'static str> {
        self.list_columns
            .iter()
            .chain(self.add_columns)
            .chain(self.edit_columns)
            .chain(self.show_columns)
            .chain(self.search_columns)
            .copied()
    }
}

fn lookup(pairs: Pairs, field: &str) -> Option<&'static str> {
    pairs.iter().find(|(k, _)| *k == field).map(|(_, v)| *v)
}

fn as_map<S: Serializer>(pairs: &Pairs, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(pairs.iter().map(|(k, v)| (*k, *v)))
}

const COLUMN_EDIT: &[&str] = &[
    "column_name",
    "verbose_name",
    "description",
    "column_type",
    "groupby",
    "filterable",
    "table_id",
    "count_distinct",
    "sum",
    "min",
    "max",
    "expression",
    "is_dttm",
    "python_date_format",
    "database_expression",
];

pub const COLUMN_VIEW: ViewConfig = ViewConfig {
    route_base: "/tablecolumninlineview",
    list_title: "List Columns",
    show_title: "Show Column",
    add_title: "Add Column",
    edit_title: "Edit Column",
    list_columns: &[
        "column_name",
        "verbose_name",
        "column_type",
        "groupby",
        "filterable",
        "count_distinct",
        "sum",
        "min",
        "max",
        "is_dttm",
    ],
    add_columns: COLUMN_EDIT,
    edit_columns: COLUMN_EDIT,
    show_columns: COLUMN_EDIT,
    search_columns: &[],
    description_columns: &[
        (
            "is_dttm",
            "Whether to make this column available as a [Time Granularity] option, \
            column has to be DATETIME or DATETIME-like",
        ),
        (
            "filterable",
            "Whether this column is exposed in the `Filters` section of the explore view.",
        ),
        (
            "column_type",
            "The data type that was inferred by the database. It may be necessary to \
            input a type manually for expression-defined columns in some cases. In most \
            cases users should not need to alter this.",
        ),
        (
            "expression",
            "A valid SQL expression as supported by the underlying backend. \
            Example: `substr(name, 1, 1)`",
        ),
        (
            "python_date_format",
            "The pattern of timestamp format, use strftime patterns. If the time is \
            stored in epoch format, put `epoch_s` or `epoch_ms`. Leave `Database \
            Expression` below empty if timestamp is stored in String or Integer(epoch) type",
        ),
        (
            "database_expression",
            "The database expression to cast internal datetime constants to database \
            date/timestamp type according to the DBAPI. The expression should follow the \
            pattern of %Y-%m-%d %H:%M:%S, based on different DBAPI. The string should be \
            a format string. Example for Oracle: `TO_DATE('{}', 'YYYY-MM-DD HH24:MI:SS')`. \
            A default expression based on the database URI is used when empty.",
        ),
    ],
    label_columns: &[
        ("column_name", "Column"),
        ("verbose_name", "Verbose Name"),
        ("description", "Description"),
        ("groupby", "Groupable"),
        ("filterable", "Filterable"),
        ("table_id", "Table"),
        ("count_distinct", "Count Distinct"),
        ("sum", "Sum"),
        ("min", "Min"),
        ("max", "Max"),
        ("expression", "Expression"),
        ("is_dttm", "Is temporal"),
        ("python_date_format", "Datetime Format"),
        ("database_expression", "Database Expression"),
        ("column_type", "Type"),
    ],
    page_size: Some(500),
    can_delete: false,
    base_order: None,
};

const METRIC_EDIT: &[&str] = &[
    "metric_name",
    "description",
    "verbose_name",
    "metric_type",
    "expression",
    "table_id",
    "d3format",
    "is_restricted",
];

pub const METRIC_VIEW: ViewConfig = ViewConfig {
    route_base: "/sqlmetricinlineview",
    list_title: "List Metrics",
    show_title: "Show Metric",
    add_title: "Add Metric",
    edit_title: "Edit Metric",
    list_columns: &["metric_name", "verbose_name", "metric_type"],
    add_columns: METRIC_EDIT,
    edit_columns: METRIC_EDIT,
    show_columns: METRIC_EDIT,
    search_columns: &[],
    description_columns: &[
        (
            "expression",
            "A valid SQL expression as supported by the underlying backend. \
            Example: `count(DISTINCT userid)`",
        ),
        (
            "is_restricted",
            "Whether access to this metric is restricted to certain roles. Only roles \
            with the permission 'metric access on XXX (the name of this metric)' are \
            allowed to access this metric",
        ),
        (
            "d3format",
            "d3 formatting string as defined at \
            https://github.com/d3/d3-format/blob/master/README.md#format. \
            For instance, this default formatting applies in the Table visualization \
            and allows for different metrics to use different formats",
        ),
    ],
    label_columns: &[
        ("metric_name", "Metric"),
        ("description", "Description"),
        ("verbose_name", "Verbose Name"),
        ("metric_type", "Type"),
        ("expression", "SQL Expression"),
        ("table_id", "Table"),
        ("d3format", "D3 Format"),
        ("is_restricted", "Is Restricted"),
    ],
    page_size: Some(500),
    can_delete: true,
    base_order: None,
};

pub const TABLE_VIEW: ViewConfig = ViewConfig {
    route_base: "/tablemodelview",
    list_title: "List Tables",
    show_title: "Show Table",
    add_title: "Add Table",
    edit_title: "Edit Table",
    list_columns: &["table_name", "database_id", "changed_on"],
    add_columns: &["database_id", "schema", "table_name"],
    edit_columns: &[
        "table_name",
        "sql",
        "filter_select_enabled",
        "fetch_values_predicate",
        "database_id",
        "schema",
        "description",
        "owner",
        "main_dttm_col",
        "default_endpoint",
        "offset",
        "cache_timeout",
    ],
    show_columns: &[
        "table_name",
        "sql",
        "filter_select_enabled",
        "fetch_values_predicate",
        "database_id",
        "schema",
        "description",
        "owner",
        "main_dttm_col",
        "default_endpoint",
        "offset",
        "cache_timeout",
        "perm",
    ],
    search_columns: &["database_id", "schema", "table_name", "owner"],
    description_columns: &[
        ("offset", "Timezone offset (in hours) for this datasource"),
        (
            "table_name",
            "Name of the table that exists in the source database",
        ),
        (
            "schema",
            "Schema, as used only in some databases like Postgres, Redshift and DB2",
        ),
        ("description", "Supports markdown"),
        (
            "sql",
            "This fields acts a view, meaning that a query will be run against this \
            string as a subquery.",
        ),
        (
            "fetch_values_predicate",
            "Predicate applied when fetching distinct value to populate the filter \
            control component. Supports jinja template syntax. Applies only when \
            `Enable Filter Select` is on.",
        ),
        (
            "default_endpoint",
            "Redirects to this endpoint when clicking on the table from the table list",
        ),
        (
            "filter_select_enabled",
            "Whether to populate the filter's dropdown in the explore view's filter \
            section with a list of distinct values fetched from the backend on the fly",
        ),
    ],
    label_columns: &[
        ("table_name", "Table Name"),
        ("database_id", "Database"),
        ("changed_on", "Last Changed"),
        ("filter_select_enabled", "Enable Filter Select"),
        ("schema", "Schema"),
        ("default_endpoint", "Default Endpoint"),
        ("offset", "Offset"),
        ("cache_timeout", "Cache Timeout"),
        ("fetch_values_predicate", "Fetch Values Predicate"),
        ("owner", "Owner"),
        ("main_dttm_col", "Main Datetime Column"),
        ("description", "Description"),
        ("sql", "SQL"),
        ("perm", "Permission"),
    ],
    page_size: None,
    can_delete: true,
    base_order: Some(("changed_on", "desc")),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_has_a_label() {
        for view in [TABLE_VIEW, COLUMN_VIEW, METRIC_VIEW] {
            for field in view.fields() {
                assert!(
                    view.label(field).is_some(),
                    "{} has no label for {}",
                    view.route_base,
                    field
                );
            }
            for (field, _) in view.description_columns {
                assert!(view.label(field).is_some());
            }
        }
    }

    #[test]
    fn columns_cannot_be_deleted() {
        assert!(!COLUMN_VIEW.can_delete);
        assert!(METRIC_VIEW.can_delete);
        assert_eq!(Some(500), COLUMN_VIEW.page_size);
        assert_eq!(Some(("changed_on", "desc")), TABLE_VIEW.base_order);
        assert_eq!(&["database_id", "schema", "table_name"], TABLE_VIEW.add_columns);
    }

    #[test]
    fn serializes_labels_as_object() {
        let info = serde_json::to_value(METRIC_VIEW).unwrap();
        assert_eq!("Metric", info["label_columns"]["metric_name"]);
        assert_eq!("List Metrics", info["list_title"]);
        assert_eq!(serde_json::Value::Null, info["base_order"]);
        assert!(info["description_columns"]["is_restricted"].is_string());
    }
}

const TOKEN_PREFIX: &str = "df1_";

const VARIABLE_LABELS: &[(&str, &str)] = &[
    ("df1_AMT_ANNUITY", "Loan Annuity"),
    ("df1_AMT_CREDIT", "Credit Amount"),
    ("df1_AMT_INCOME_TOTAL", "Total Income"),
    (
        "df1_AMT_REQ_CREDIT_BUREAU_MON",
        "Credit Bureau Enquiries (Monthly)",
    ),
    ("df1_APARTMENTS_AVG", "Average Apartment Size"),
    ("df1_DAYS_BIRTH", "Age (Days)"),
    ("df1_DAYS_EMPLOYED", "Days Employed"),
    ("df1_DAYS_LAST_PHONE_CHANGE", "Days Since Last Phone Change"),
    ("df1_DAYS_REGISTRATION", "Registration Days"),
    ("df1_CODE_GENDER", "Gender"),
    ("df1_FLAG_OWN_CAR", "Car Ownership"),
    ("df1_FLAG_OWN_REALTY", "Realty Ownership"),
    ("df1_CNT_CHILDREN", "Child Count"),
    ("df1_NAME_EDUCATION_TYPE", "Education Level"),
    ("df1_NAME_FAMILY_STATUS", "Family Status"),
    ("df1_NAME_HOUSING_TYPE", "Housing Type"),
    ("df1_NAME_INCOME_TYPE", "Income Type"),
    ("df1_OCCUPATION_TYPE", "Occupation"),
    ("df1_ORGANIZATION_TYPE", "Organization Type"),
    ("df1_EXT_SOURCE_1", "External Source 1"),
    ("df1_EXT_SOURCE_2", "External Source 2"),
    ("df1_EXT_SOURCE_3", "External Source 3"),
];

const ATTRIBUTE_INSIGHTS: &[(&str, &str)] = &[
    (
        "df1_AMT_ANNUITY",
        "It is generally observed that individuals who tend to pay higher annuity, tend to default less frequently.",
    ),
    (
        "df1_APARTMENTS_AVG",
        "It is generally observed that individuals who live in areas with high apartment sizes on average, tend to default less frequently.",
    ),
    (
        "df1_DAYS_EMPLOYED",
        "It is generally observed that individuals who have changed their jobs quite long before they apply for a loan, tend to default less frequently.",
    ),
    (
        "df1_DAYS_LAST_PHONE_CHANGE",
        "It is generally observed that individuals who have changed their phone numbers around 5+ years ago before applying, tend to default less frequently.",
    ),
    (
        "df1_AMT_CREDIT",
        "It is generally observed that individuals who tend to request and receive high credit amounts for their loans, tend to default less frequently.",
    ),
    (
        "df1_AMT_INCOME_TOTAL",
        "It is generally observed that individuals who tend to have higher total incomes, tend to default less frequently.",
    ),
    (
        "df1_AMT_REQ_CREDIT_BUREAU_MON",
        "It is generally observed that individuals who tend to check their credit scores high number of times within a month, tend to default less frequently.",
    ),
    (
        "df1_DAYS_BIRTH",
        "It is generally observed that individuals who are born earlier, tend to default less frequently but the margin is quite less.",
    ),
    (
        "df1_DAYS_REGISTRATION",
        "It is generally observed that individuals who have changed their registrations long before applying for a loan, tend to default less frequently.",
    ),
];

pub fn format_label(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    if let Some(label) = lookup(VARIABLE_LABELS, token) {
        return label.to_string();
    }
    title_case(&token.replace(TOKEN_PREFIX, "").replace('_', " "))
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

pub fn attribute_insight(token: &str) -> Option<&'static str> {
    lookup(ATTRIBUTE_INSIGHTS, token)
}

pub fn insights_for(var1: &str, var2: &str) -> Vec<(String, &'static str)> {
    let mut out = Vec::new();
    if let Some(text) = attribute_insight(var1) {
        out.push((format_label(var1), text));
    }
    if var1 != var2
        && let Some(text) = attribute_insight(var2)
    {
        out.push((format_label(var2), text));
    }
    out
}

pub fn heading(var1: &str, var2: &str) -> String {
    format!("{} vs {}", format_label(var1), format_label(var2))
}

fn lookup(table: &[(&str, &'static str)], token: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(key, _)| *key == token)
        .map(|(_, value)| *value)
}

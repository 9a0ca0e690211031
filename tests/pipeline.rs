use dataconst::data::loader::SheetSelector;
use dataconst::data::model::{CellValue, ColumnType};
use dataconst::{
    build_chart_spec, ingest, ingest_with, preview, summarize, ChartError, ChartKind,
    ChartRequest, IngestError, IngestOptions,
};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

const SALES_CSV: &str = "\
date,region,units,price
2024-01-01,North,12,9.5
2024-01-02,South,7,
2024-01-03,North,15,10.25
2024-01-04,East,3,8.0
";

#[test]
fn csv_upload_flows_through_summary_and_charts() {
    let table = ingest(SALES_CSV.as_bytes(), ".CSV").unwrap();
    assert_eq!(table.shape(), (4, 4));

    let profile = summarize(&table);
    assert_eq!(profile.row_count, table.row_count());
    assert!(profile.column_profiles.len() <= profile.column_count);
    let names: Vec<&str> = profile
        .column_profiles
        .iter()
        .map(|p| p.column.as_str())
        .collect();
    assert_eq!(names, ["units", "price"]);
    assert_eq!(profile.column_profiles[1].count, 3);
    assert_eq!(profile.text_profiles[0].top.as_deref(), Some("North"));
    assert_eq!(profile, summarize(&table));

    let request = ChartRequest::new(ChartKind::TimeSeries, &["date", "units"]).unwrap();
    let spec = build_chart_spec(&table, &request).unwrap();
    assert_eq!(spec.title, "Evolution of units over time");
    let x = spec.x.as_ref().unwrap();
    assert_eq!(x.column_type, ColumnType::Temporal);
    assert_eq!(x.values.len(), 4);
    assert_eq!(spec.y.as_ref().unwrap().values[1], CellValue::Integer(7));

    let shown = preview(&table, 2);
    assert_eq!(shown.rows.len(), 2);
    assert_eq!(shown.rows[1][3], "NaN");
}

#[test]
fn age_column_profile() {
    let table = ingest(b"age\n10\n20\n30\n40\n", "csv").unwrap();
    let profile = summarize(&table);
    let age = &profile.column_profiles[0];
    assert_eq!(age.count, 4);
    assert_eq!(age.mean, Some(25.0));
    assert_eq!(age.min, Some(10.0));
    assert_eq!(age.median, Some(25.0));
    assert_eq!(age.max, Some(40.0));
    assert!((age.std.unwrap() - 12.909944).abs() < 1e-6);
}

#[test]
fn header_only_csv_is_valid_and_empty() {
    let table = ingest(b"a,b,c\n", "csv").unwrap();
    assert_eq!(table.shape(), (0, 3));
    let profile = summarize(&table);
    assert_eq!(profile.row_count, 0);
    assert_eq!(profile.column_count, 3);
}

#[test]
fn unsupported_extension_builds_nothing() {
    let err = ingest(SALES_CSV.as_bytes(), ".txt").unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedFormat(ref ext) if ext == "txt"));
}

#[test]
fn chart_requests_are_validated_against_the_table() {
    let table = ingest(SALES_CSV.as_bytes(), "csv").unwrap();

    let missing = ChartRequest::Histogram {
        column: "missing".into(),
    };
    assert_eq!(
        build_chart_spec(&table, &missing).unwrap_err(),
        ChartError::UnknownColumn("missing".into())
    );

    let err = ChartRequest::new(ChartKind::Scatter, &["units"]).unwrap_err();
    assert_eq!(
        err,
        ChartError::ArityMismatch {
            kind: ChartKind::Scatter,
            expected: 2,
            received: 1
        }
    );

    let same = ChartRequest::Scatter {
        x: "units".into(),
        y: "units".into(),
    };
    assert!(matches!(
        build_chart_spec(&table, &same),
        Err(ChartError::ArityMismatch { .. })
    ));
}

fn workbook_bytes() -> Vec<u8> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Scores").unwrap();
        sheet.write_string(0, 0, "name").unwrap();
        sheet.write_string(0, 1, "score").unwrap();
        for (row, (name, score)) in [("ana", 7.5), ("bo", 9.0), ("cy", 6.0)].iter().enumerate() {
            let row = row as u32 + 1;
            sheet.write_string(row, 0, *name).unwrap();
            sheet.write_number(row, 1, *score).unwrap();
        }
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Sales").unwrap();
        sheet.write_string(0, 0, "units").unwrap();
        sheet.write_number(1, 0, 4.0).unwrap();
        sheet.write_number(2, 0, 6.0).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

#[test]
fn xlsx_upload_reads_first_sheet_by_default() {
    let table = ingest(&workbook_bytes(), "xlsx").unwrap();
    assert_eq!(table.column_names(), ["name", "score"]);
    assert_eq!(table.row_count(), 3);

    let profile = summarize(&table);
    let score = &profile.column_profiles[0];
    assert_eq!(score.column, "score");
    assert_eq!(score.mean, Some(7.5));
    assert_eq!(score.max, Some(9.0));

    let request = ChartRequest::new(ChartKind::BoxPlot, &["score"]).unwrap();
    let spec = build_chart_spec(&table, &request).unwrap();
    assert_eq!(spec.title, "Box Plot of score");
    assert_eq!(spec.y.unwrap().values.len(), 3);
}

#[test]
fn xlsx_sheet_can_be_selected_by_name() {
    let options = IngestOptions {
        sheet: Some(SheetSelector::Name("Sales".into())),
        ..IngestOptions::default()
    };
    let table = ingest_with(&workbook_bytes(), "xlsx", &options).unwrap();
    assert_eq!(table.column_names(), ["units"]);
    let units = table.column("units").unwrap();
    assert_eq!(units.column_type(), ColumnType::Integer);
    assert_eq!(units.value(1), CellValue::Integer(6));

    let missing = IngestOptions {
        sheet: Some(SheetSelector::Name("Nope".into())),
        ..IngestOptions::default()
    };
    assert!(matches!(
        ingest_with(&workbook_bytes(), "xlsx", &missing),
        Err(IngestError::Parse { .. })
    ));
}

#[test]
fn xlsx_date_cells_are_temporal() {
    let mut workbook = Workbook::new();
    {
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "day").unwrap();
        sheet.write_string(0, 1, "visits").unwrap();
        for (i, day) in [15u8, 16, 17].iter().enumerate() {
            let row = i as u32 + 1;
            let date = ExcelDateTime::from_ymd(2024, 1, *day).unwrap();
            sheet.write_datetime_with_format(row, 0, &date, &date_format).unwrap();
            sheet.write_number(row, 1, 10.0 * f64::from(*day)).unwrap();
        }
    }
    let bytes = workbook.save_to_buffer().unwrap();

    let table = ingest(&bytes, "xlsx").unwrap();
    let day = table.column("day").unwrap();
    assert_eq!(day.column_type(), ColumnType::Temporal);
    assert_eq!(day.value(0).to_string(), "2024-01-15 00:00:00");

    let profile = summarize(&table);
    let names: Vec<&str> = profile
        .column_profiles
        .iter()
        .map(|p| p.column.as_str())
        .collect();
    assert_eq!(names, ["visits"]);

    let request = ChartRequest::new(ChartKind::TimeSeries, &["day", "visits"]).unwrap();
    let spec = build_chart_spec(&table, &request).unwrap();
    assert_eq!(spec.x.unwrap().column_type, ColumnType::Temporal);
}

#[test]
fn profiles_and_specs_serialize_to_json() {
    let table = ingest(SALES_CSV.as_bytes(), "csv").unwrap();

    let profile = serde_json::to_value(summarize(&table)).unwrap();
    assert_eq!(profile["row_count"], 4);
    assert_eq!(profile["column_profiles"][0]["column"], "units");

    let request: ChartRequest =
        serde_json::from_str(r#"{"kind":"histogram","column":"region"}"#).unwrap();
    let spec = serde_json::to_value(build_chart_spec(&table, &request).unwrap()).unwrap();
    assert_eq!(spec["kind"], "histogram");
    assert_eq!(spec["title"], "Distribution of region");
    assert_eq!(spec["x"]["values"][0], "North");
    assert!(spec["y"].is_null());
}

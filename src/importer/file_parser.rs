// ==========================================
// 员工导入系统 - 文件解析器实现（TabularReader）
// ==========================================
// 支持: Excel (.xlsx) / CSV (.csv)
// 输入: 内存中的文件字节（上传内容）
// 输出: 表头 + 有序数据行（行号 = 文件实际行号）
// ==========================================

use crate::domain::import::{CellValue, FileFormat, ParsedTable, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Cursor;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// 按扩展名判定文件格式（读取前的前置检查，大小写不敏感）
pub fn detect_format(file_name: &str) -> ImportResult<FileFormat> {
    let lower = file_name.trim().to_lowercase();
    if lower.ends_with(".xlsx") {
        Ok(FileFormat::Xlsx)
    } else if lower.ends_with(".csv") {
        Ok(FileFormat::Csv)
    } else {
        let ext = lower
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext))
            .unwrap_or_default();
        Err(ImportError::UnsupportedFormat(ext))
    }
}

/// 组装一行；完全空白的行返回 None
fn build_row(
    headers: &[String],
    row_number: usize,
    cells: impl Iterator<Item = CellValue>,
) -> Option<RawRow> {
    let mut row_map = HashMap::new();
    for (header, value) in headers.iter().zip(cells) {
        // 空表头列忽略；重名列保留第一次出现
        if header.is_empty() {
            continue;
        }
        row_map.entry(header.clone()).or_insert(value);
    }

    if row_map.values().all(CellValue::is_blank) {
        return None;
    }

    Some(RawRow {
        row_number,
        cells: row_map,
    })
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_table(&self, bytes: &[u8]) -> ImportResult<ParsedTable> {
        // 先去除 BOM，保证记录字节偏移与 data 对齐
        let data = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(data);

        // 读取表头（去除首尾空白）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有行
        // 记录位置停在上一条记录之后，被跳过的空行不计入，需向后越过换行符再统计行号
        let mut rows = Vec::new();
        let mut scanned = 0usize;
        let mut line = 1usize;
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = match record.position() {
                Some(pos) => {
                    let mut start = (pos.byte() as usize).min(data.len());
                    while start < data.len() && matches!(data[start], b'\r' | b'\n') {
                        start += 1;
                    }
                    if start > scanned {
                        line += data[scanned..start].iter().filter(|&&b| b == b'\n').count();
                        scanned = start;
                    }
                    line
                }
                None => idx + 2,
            };

            let cells = record.iter().map(|v| CellValue::Text(v.to_string()));
            if let Some(row) = build_row(&headers, row_number, cells) {
                rows.push(row);
            }
        }

        Ok(ParsedTable { headers, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    fn to_cell(data: &Data) -> CellValue {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_table(&self, bytes: &[u8]) -> ImportResult<ParsedTable> {
        let mut workbook: Xlsx<Cursor<&[u8]>> = Xlsx::new(Cursor::new(bytes))?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::UnreadableFile("工作簿不包含工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // Range 从第一个非空单元格开始，换算回工作表的绝对行号
        let start_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = match sheet_rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            None => return Ok(ParsedTable::default()),
        };

        // 表头位于 start_row + 1（1 起始），第 i 个数据行位于 start_row + i + 2
        let mut rows = Vec::new();
        for (offset, data_row) in sheet_rows.enumerate() {
            let row_number = start_row + offset + 2;
            let cells = data_row.iter().map(Self::to_cell);
            if let Some(row) = build_row(&headers, row_number, cells) {
                rows.push(row);
            }
        }

        Ok(ParsedTable { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("staff.xlsx").unwrap(), FileFormat::Xlsx);
        assert_eq!(detect_format("STAFF.XLSX").unwrap(), FileFormat::Xlsx);
        assert_eq!(detect_format("staff.csv").unwrap(), FileFormat::Csv);

        match detect_format("staff.xls") {
            Err(ImportError::UnsupportedFormat(ext)) => assert_eq!(ext, ".xls"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
        assert!(matches!(
            detect_format("README"),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let bytes = b"COMPANY_NAME,EMPLOYEE_ID\nAcme,1\nGlobex,2\n";

        let table = CsvParser.parse_table(bytes).unwrap();

        assert_eq!(table.headers, vec!["COMPANY_NAME", "EMPLOYEE_ID"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row_number, 2);
        assert_eq!(
            table.rows[0].get("COMPANY_NAME"),
            &CellValue::Text("Acme".to_string())
        );
        assert_eq!(table.rows[1].row_number, 3);
    }

    #[test]
    fn test_csv_parser_keeps_line_numbers_across_blank_rows() {
        let bytes = b"COMPANY_NAME,EMPLOYEE_ID\nAcme,1\n,\n\nGlobex,2\n";

        let table = CsvParser.parse_table(bytes).unwrap();

        // 空白行跳过，后续行号不变
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row_number, 2);
        assert_eq!(table.rows[1].row_number, 5);
    }

    #[test]
    fn test_csv_parser_counts_consecutive_empty_crlf_lines() {
        let bytes = b"COMPANY_NAME,EMPLOYEE_ID\r\n\r\n\r\nAcme,1\r\n\r\nGlobex,2";

        let table = CsvParser.parse_table(bytes).unwrap();

        let rows: Vec<usize> = table.rows.iter().map(|r| r.row_number).collect();
        assert_eq!(rows, vec![4, 6]);
    }

    #[test]
    fn test_csv_parser_line_numbers_with_bom_and_quoted_newline() {
        let bytes = "\u{feff}COMPANY_NAME,NOTE\n\n\"Acme\",\"two\nlines\"\n\nGlobex,x\n".as_bytes();

        let table = CsvParser.parse_table(bytes).unwrap();

        // 引号内换行属于记录本身，下一条记录行号照常递增
        let rows: Vec<usize> = table.rows.iter().map(|r| r.row_number).collect();
        assert_eq!(rows, vec![3, 6]);
    }

    #[test]
    fn test_csv_parser_strips_bom_and_header_whitespace() {
        let bytes = "\u{feff} COMPANY_NAME , SALARY\nAcme,100\n".as_bytes();

        let table = CsvParser.parse_table(bytes).unwrap();

        assert_eq!(table.headers, vec!["COMPANY_NAME", "SALARY"]);
    }

    #[test]
    fn test_csv_parser_short_row_is_tolerated() {
        let bytes = b"COMPANY_NAME,EMPLOYEE_ID,SALARY\nAcme,1\n";

        let table = CsvParser.parse_table(bytes).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("SALARY"), &CellValue::Empty);
    }

    #[test]
    fn test_csv_parser_invalid_utf8_is_unreadable() {
        let bytes: &[u8] = b"COMPANY_NAME\n\xff\xfe\xfd\n";

        let result = CsvParser.parse_table(bytes);

        assert!(matches!(result, Err(ImportError::UnreadableFile(_))));
    }

    #[test]
    fn test_excel_parser_rejects_non_zip_bytes() {
        let result = ExcelParser.parse_table(b"COMPANY_NAME,EMPLOYEE_ID\nAcme,1\n");

        assert!(matches!(result, Err(ImportError::UnreadableFile(_))));
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let table = CsvParser.parse_table(b"COMPANY_NAME,EMPLOYEE_ID\n").unwrap();

        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
    }
}

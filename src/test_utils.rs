use crate::clock::FixedClock;
use crate::models::*;
use crate::record::OrderRecord;
use crate::types::FieldValue;

use axum::response::Response;
use time::OffsetDateTime;
use url::Url;

/// Create a RequestData object with only required fields set.
pub(crate) fn get_test_request_data() -> RequestData {
    RequestData {
        source: Url::parse("http://example.com").unwrap(),
        bucket: "sales".to_string(),
        object: "orders.csv".to_string(),
        compression: None,
        top_regions: None,
    }
}

/// Create a RequestData object with all fields set.
pub(crate) fn get_test_request_data_optional() -> RequestData {
    RequestData {
        source: Url::parse("http://example.com").unwrap(),
        bucket: "sales".to_string(),
        object: "orders.csv".to_string(),
        compression: Some(Compression::Gzip),
        top_regions: Some(5),
    }
}

/// Create an order record with string fields, as read from a CSV dataset.
pub(crate) fn order(fields: &[(&str, &str)]) -> OrderRecord {
    fields
        .iter()
        .map(|(name, value)| (*name, FieldValue::from(*value)))
        .collect()
}

/// A clock stopped at 2023-11-14T22:13:20Z.
pub(crate) fn fixed_clock() -> FixedClock {
    FixedClock(OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap())
}

/// A small CSV dataset covering cancelled orders, several months, categories, sizes and states,
/// as well as empty cells.
pub(crate) const SAMPLE_CSV: &str = "\
Order ID,Status,Fulfilment,fulfilled-by,Category,Size,Qty,Amount,ship-state,B2B,Year,Month,MonthName
405-8078784-5731545,Cancelled,Merchant,Easy Ship,Set,S,0,647.62,MAHARASHTRA,False,2022,4,April
171-9198151-1101146,Shipped - Delivered to Buyer,Merchant,Easy Ship,kurta,3XL,1,406.00,KARNATAKA,False,2022,4,April
404-0687676-7273146,Shipped,Amazon,Amazon,kurta,XL,1,329.00,MAHARASHTRA,True,2022,4,April
403-9615377-8133951,Cancelled,Merchant,Easy Ship,Western Dress,L,0,753.33,PUDUCHERRY,False,2022,5,May
407-1069790-7240320,Shipped,Amazon,Amazon,Top,3XL,1,574.00,TAMIL NADU,False,2022,5,May
404-1490984-4578765,Shipped,Amazon,Amazon,Set,XL,1,824.00,UTTAR PRADESH,False,2022,5,May
406-7807733-3785945,Shipped,Merchant,Merchant,Set,M,2,1306.50,MAHARASHTRA,True,2022,6,June
402-4393761-0311520,Shipped,Amazon,Amazon,kurta,S,1,,KARNATAKA,False,2022,6,June
408-7955685-3083534,Pending,Amazon,,Set,M,1,399.00,,False,2022,6,June
";

/// The records of [SAMPLE_CSV].
pub(crate) fn sample_records() -> Vec<OrderRecord> {
    crate::dataset::parse_csv(SAMPLE_CSV.as_bytes()).unwrap()
}

/// Read the body of a response as a string.
pub(crate) async fn body_string(response: Response) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

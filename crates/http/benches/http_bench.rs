use std::error::Error;
use std::hint::black_box;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use criterion::{Criterion, criterion_group, criterion_main};
use http::{Response, StatusCode};
use http_body_util::BodyExt;
use rawhttp::codec::{RequestDecoder, ResponseEncoder};
use rawhttp::config::ServerConfig;
use rawhttp::connection::HttpConnection;
use rawhttp::handler::make_handler;
use rawhttp::protocol::body::{ReqBody, ResponseBody};
use rawhttp::protocol::{Message, PayloadItem, PayloadSize, Request, ResponseHead};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::runtime::Runtime;
use tokio_util::codec::{Decoder, Encoder};

const SIMPLE_REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: localhost\r\nUser-Agent: bench\r\nAccept: */*\r\n\r\n";
const CHUNKED_REQUEST: &[u8] =
    b"POST /upload HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";

async fn echo(request: Request<ReqBody>) -> Result<Response<ResponseBody>, Box<dyn Error + Send + Sync>> {
    let body = request.into_body().collect().await?.to_bytes();
    Ok(Response::builder().status(StatusCode::OK).body(ResponseBody::full(body))?)
}

fn decode_all(request: &[u8]) -> usize {
    let mut decoder = RequestDecoder::default();
    let mut bytes = BytesMut::from(request);
    let mut messages = 0;
    while let Some(message) = decoder.decode(&mut bytes).unwrap() {
        black_box(&message);
        messages += 1;
    }
    messages
}

fn bench_request_decoder(c: &mut Criterion) {
    c.bench_function("decode_simple_request", |b| b.iter(|| decode_all(black_box(SIMPLE_REQUEST))));
    c.bench_function("decode_chunked_request", |b| b.iter(|| decode_all(black_box(CHUNKED_REQUEST))));
}

fn bench_response_encoder(c: &mut Criterion) {
    let body = Bytes::from_static(b"Hello World!");

    c.bench_function("encode_simple_response", |b| {
        b.iter(|| {
            let mut encoder = ResponseEncoder::new();
            let mut bytes = BytesMut::new();
            let head = ResponseHead::new(());
            let header = Message::<_, Bytes>::Header((head, PayloadSize::Length(body.len() as u64)));
            encoder.encode(header, &mut bytes).unwrap();
            encoder.encode(Message::<(ResponseHead, PayloadSize)>::Payload(PayloadItem::Chunk(body.clone())), &mut bytes).unwrap();
            encoder.encode(Message::<(ResponseHead, PayloadSize)>::Payload(PayloadItem::Eof), &mut bytes).unwrap();
            black_box(bytes)
        });
    });
}

fn bench_http_connection(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let config = Arc::new(ServerConfig::default());
    let handler = Arc::new(make_handler(echo));

    c.bench_function("process_chunked_request", |b| {
        b.to_async(&runtime).iter(|| {
            let config = Arc::clone(&config);
            let handler = Arc::clone(&handler);
            async move {
                let (mut client, server) = tokio::io::duplex(16 * 1024);
                let (reader, writer) = tokio::io::split(server);
                let connection = HttpConnection::new(reader, writer, config);

                let client = async move {
                    client.write_all(CHUNKED_REQUEST).await.unwrap();
                    client.shutdown().await.unwrap();
                    let mut output = Vec::new();
                    client.read_to_end(&mut output).await.unwrap();
                    output
                };

                let (result, output) = tokio::join!(connection.process(handler), client);
                result.unwrap();
                black_box(output)
            }
        });
    });
}

criterion_group!(benches, bench_request_decoder, bench_response_encoder, bench_http_connection);
criterion_main!(benches);

//! Retained-message delivery on subscribe, and last-will registration at
//! CONNECT time.

mod common;

use mqtt_client::{Client, ClientConfig, ConnectOptions, QoS, SubscriptionOptions, TopicFilter, TopicName, WillOptions};

#[tokio::test]
async fn retained_message_is_delivered_right_after_suback() {
    let (transport, mut broker) = common::pair();
    let client = Client::new(transport, ClientConfig::default());

    let connect_task = {
        let client = client.clone();
        tokio::spawn(async move { client.connect(ConnectOptions::default()).await })
    };
    broker.recv_frame().await;
    broker.send(&common::connack(false, 0x00)).await;
    connect_task.await.unwrap().unwrap();

    let filter = TopicFilter::new("home/+/temperature").unwrap();
    let subscribe_task = {
        let client = client.clone();
        tokio::spawn(async move { client.subscribe(filter, SubscriptionOptions::new(QoS::AtMostOnce)).await })
    };
    let (_, _, body) = broker.recv_frame().await;
    let id = common::packet_id_of(&body);
    broker.send(&common::suback(id, &[0x00])).await;
    let mut sub = subscribe_task.await.unwrap().unwrap();

    // A broker with matching retained messages sends them immediately after
    // the SUBACK, with the RETAIN flag set.
    broker.send(&common::publish("home/kitchen/temperature", b"21.5", 0, true, false, None)).await;

    let message = sub.recv().await.unwrap();
    assert_eq!(message.topic, TopicName::new("home/kitchen/temperature").unwrap());
    assert!(message.retain);
    assert_eq!(&message.payload[..], b"21.5");
}

#[tokio::test]
async fn connect_with_will_sets_will_flag_and_qos_in_connect_flags() {
    let (transport, mut broker) = common::pair();
    let client = Client::new(transport, ClientConfig::default());

    let will = WillOptions::new(TopicName::new("device/status").unwrap(), &b"offline"[..])
        .with_qos(QoS::AtLeastOnce)
        .with_retain(true);
    let options = ConnectOptions { will: Some(will), ..Default::default() };

    let connect_task = {
        let client = client.clone();
        tokio::spawn(async move { client.connect(options).await })
    };

    let (packet_type, _flags, body) = broker.recv_frame().await;
    assert_eq!(packet_type, common::CONNECT);
    let (will_present, will_qos, will_retain) = common::connect_will_flags(&body).expect("will flag must be set");
    assert!(will_present);
    assert_eq!(will_qos, QoS::AtLeastOnce.as_u8());
    assert!(will_retain);

    broker.send(&common::connack(false, 0x00)).await;
    connect_task.await.unwrap().unwrap();
}
